//! NPN canonicalization for functions of up to four variables.
//!
//! Two functions are NPN-equivalent when one can be obtained from the other
//! by negating inputs, permuting inputs, and negating the output. For n <= 4
//! the orbit is small enough (at most 768 transforms) that the canonical
//! representative is found by exhaustive search.

use crate::table::TruthTable;
use serde::{Deserialize, Serialize};

/// An NPN transform: input permutation, input negation mask, output negation.
///
/// Applying the transform to `f` yields `g` with
/// `g(x) = out ^ f(z)` where `z[i] = x[perm[i]] ^ neg[i]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NpnTransform {
    /// Input permutation; identity beyond the function's arity.
    pub perm: [u8; 4],
    /// Input negation mask (bit i negates argument i of `f`).
    pub input_neg: u8,
    /// Output negation.
    pub output_neg: bool,
}

impl NpnTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        NpnTransform {
            perm: [0, 1, 2, 3],
            input_neg: 0,
            output_neg: false,
        }
    }

    /// The inverse transform, satisfying
    /// `apply(&apply(f, t), &t.inverse()) == f`.
    pub fn inverse(&self) -> NpnTransform {
        let mut perm = [0u8; 4];
        let mut input_neg = 0u8;
        for i in 0..4 {
            let j = self.perm[i] as usize;
            perm[j] = i as u8;
            if self.input_neg >> i & 1 == 1 {
                input_neg |= 1 << j;
            }
        }
        NpnTransform {
            perm,
            input_neg,
            output_neg: self.output_neg,
        }
    }
}

/// Applies an NPN transform to a word table of at most four variables.
pub fn apply(f: &TruthTable, t: &NpnTransform) -> TruthTable {
    let vars = f.num_vars();
    assert!(vars <= 4, "NPN transforms cover at most 4 variables");
    let mut out = TruthTable::zeros(vars);
    for index in 0..f.num_bits() {
        let mut z = 0usize;
        for i in 0..vars as usize {
            let xi = index >> t.perm[i] as usize & 1;
            let zi = xi ^ (t.input_neg as usize >> i & 1);
            z |= zi << i;
        }
        if f.get_bit(z) != t.output_neg {
            out.set_bit(index);
        }
    }
    out
}

fn permutations(n: usize) -> Vec<[u8; 4]> {
    let mut result = Vec::new();
    let mut items: Vec<u8> = (0..n as u8).collect();
    permute_rec(&mut items, 0, &mut result);
    result
}

fn permute_rec(items: &mut Vec<u8>, at: usize, out: &mut Vec<[u8; 4]>) {
    if at == items.len() {
        let mut perm = [0u8, 1, 2, 3];
        for (i, &v) in items.iter().enumerate() {
            perm[i] = v;
        }
        out.push(perm);
        return;
    }
    for i in at..items.len() {
        items.swap(at, i);
        permute_rec(items, at + 1, out);
        items.swap(at, i);
    }
}

/// Returns the canonical NPN representative of `f` together with the
/// transform producing it: `apply(f, t) == canonical`.
///
/// The canonical form is the numerically smallest table over the orbit,
/// which makes the choice deterministic across runs.
pub fn canonicalize(f: &TruthTable) -> (TruthTable, NpnTransform) {
    let vars = f.num_vars();
    assert!(vars <= 4, "NPN canonicalization covers at most 4 variables");

    let mut best: Option<(u64, TruthTable, NpnTransform)> = None;
    for perm in permutations(vars as usize) {
        for input_neg in 0..(1u8 << vars) {
            for output_neg in [false, true] {
                let t = NpnTransform {
                    perm,
                    input_neg,
                    output_neg,
                };
                let g = apply(f, &t);
                let key = match g {
                    TruthTable::Word { bits, .. } => bits,
                    TruthTable::Bits { .. } => unreachable!("vars <= 4"),
                };
                let replace = match &best {
                    Some((k, _, _)) => key < *k,
                    None => true,
                };
                if replace {
                    best = Some((key, g, t));
                }
            }
        }
    }
    let (_, canonical, transform) = best.expect("orbit is never empty");
    (canonical, transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        let f = TruthTable::from_hex_str("e8").unwrap();
        assert_eq!(apply(&f, &NpnTransform::identity()), f);
    }

    #[test]
    fn inverse_roundtrip() {
        let f = TruthTable::from_bits(4, 0xCA53);
        for perm in permutations(4) {
            for input_neg in [0u8, 0b0101, 0b1111] {
                for output_neg in [false, true] {
                    let t = NpnTransform {
                        perm,
                        input_neg,
                        output_neg,
                    };
                    let g = apply(&f, &t);
                    assert_eq!(apply(&g, &t.inverse()), f);
                }
            }
        }
    }

    #[test]
    fn npn_equivalent_functions_share_canon() {
        let f = TruthTable::from_bits(4, 0x8000); // x0 & x1 & x2 & x3
        // NAND of permuted, negated inputs is in the same orbit.
        let t = NpnTransform {
            perm: [2, 0, 3, 1],
            input_neg: 0b1010,
            output_neg: true,
        };
        let g = apply(&f, &t);
        let (cf, _) = canonicalize(&f);
        let (cg, _) = canonicalize(&g);
        assert_eq!(cf, cg);
    }

    #[test]
    fn canonical_transform_reproduces_canon() {
        for bits in [0x0001u64, 0x1234, 0x8421, 0x6996, 0xFEED] {
            let f = TruthTable::from_bits(4, bits);
            let (canon, t) = canonicalize(&f);
            assert_eq!(apply(&f, &t), canon);
            assert_eq!(apply(&canon, &t.inverse()), f);
        }
    }

    #[test]
    fn distinct_classes_stay_distinct() {
        let and2 = TruthTable::from_binary_str("1000").unwrap();
        let xor2 = TruthTable::from_binary_str("0110").unwrap();
        let (ca, _) = canonicalize(&and2);
        let (cx, _) = canonicalize(&xor2);
        assert_ne!(ca, cx);
    }

    #[test]
    fn class_count_for_two_variables() {
        // The 16 two-variable functions fall into exactly 4 NPN classes.
        let mut canons = std::collections::HashSet::new();
        for bits in 0u64..16 {
            let f = TruthTable::from_bits(2, bits);
            let (canon, _) = canonicalize(&f);
            canons.insert(canon.to_binary_string());
        }
        assert_eq!(canons.len(), 4);
    }
}
