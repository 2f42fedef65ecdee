//! Zhegalkin (positive-polarity Reed–Muller) synthesis.

use crate::Synthesizer;
use veles_subnet::{CellSymbol, Link, Subnet, SubnetBuilder, IN_PLACE_LINKS};
use veles_tt::TruthTable;

/// Computes the ring-sum-of-products coefficients of `f`.
///
/// `coeffs[m]` is the coefficient of the monomial whose variable set is the
/// bit set of `m`. The in-place butterfly runs one pass per variable.
pub fn rm_polynomial(f: &TruthTable) -> Vec<bool> {
    let n = f.num_vars();
    let size = 1usize << n;
    let mut coeffs: Vec<bool> = (0..size).map(|i| f.get_bit(i)).collect();
    for var in 0..n {
        let stride = 1usize << var;
        for m in 0..size {
            if m & stride != 0 {
                coeffs[m] ^= coeffs[m ^ stride];
            }
        }
    }
    coeffs
}

/// Emits the subnet of an ESOP: one AND tree per monomial, a XOR tree over
/// the terms, with the constant term fused as an initial ONE.
///
/// `polarity` bit `i` pre-complements variable `i` (the polarized input is
/// materialized as an explicit inverter so downstream terms share it).
pub(crate) fn build_esop(
    coeffs: &[bool],
    polarity: u32,
    n_vars: u32,
    max_arity: usize,
) -> Subnet {
    let max_arity = max_arity.clamp(2, IN_PLACE_LINKS);
    let mut builder = SubnetBuilder::new();
    let inputs = builder.add_inputs(n_vars as usize);
    let mut literals: Vec<Link> = inputs.clone();
    for i in 0..n_vars {
        if polarity >> i & 1 == 1 {
            literals[i as usize] = builder.add_cell(CellSymbol::Buf, &[!inputs[i as usize]]);
        }
    }

    let mut terms: Vec<Link> = Vec::new();
    if coeffs[0] {
        terms.push(builder.add_cell(CellSymbol::One, &[]));
    }
    for (monomial, &coeff) in coeffs.iter().enumerate().skip(1) {
        if !coeff {
            continue;
        }
        let fanins: Vec<Link> = (0..n_vars)
            .filter(|&v| monomial >> v & 1 == 1)
            .map(|v| literals[v as usize])
            .collect();
        let term = if fanins.len() == 1 {
            fanins[0]
        } else {
            builder.add_cell_tree(CellSymbol::And, &fanins, max_arity)
        };
        terms.push(term);
    }

    let out = match terms.len() {
        0 => builder.add_cell(CellSymbol::Zero, &[]),
        1 => terms[0],
        _ => builder.add_cell_tree(CellSymbol::Xor, &terms, max_arity),
    };
    builder.add_output(out);
    builder.make(true)
}

/// Positive-polarity Reed–Muller synthesis.
///
/// The care mask is ignored: the canonical Zhegalkin polynomial is derived
/// from the fully-specified function.
#[derive(Default)]
pub struct ZhegalkinSynthesizer;

impl Synthesizer for ZhegalkinSynthesizer {
    fn synthesize(
        &self,
        func: &TruthTable,
        _care: &TruthTable,
        max_arity: usize,
    ) -> Option<Subnet> {
        let coeffs = rm_polynomial(func);
        Some(build_esop(&coeffs, 0, func.num_vars(), max_arity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, zoo};
    use veles_subnet::eval::evaluate_single_out;

    #[test]
    fn polynomial_of_xor_is_linear() {
        let f = TruthTable::from_hex_str("96").unwrap();
        let coeffs = rm_polynomial(&f);
        let monomials: Vec<usize> = coeffs
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(|(m, _)| m)
            .collect();
        assert_eq!(monomials, vec![1, 2, 4], "x0 ^ x1 ^ x2");
    }

    #[test]
    fn polynomial_of_and_is_single_monomial() {
        let f = TruthTable::from_binary_str("1000").unwrap();
        let coeffs = rm_polynomial(&f);
        let ones: Vec<usize> = coeffs
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(|(m, _)| m)
            .collect();
        assert_eq!(ones, vec![3], "x0 & x1");
    }

    #[test]
    fn constant_zero_is_one_cell() {
        let subnet = ZhegalkinSynthesizer
            .synthesize_exact(&TruthTable::zeros(2))
            .unwrap();
        assert_eq!(subnet.internal_count(), 1);
        assert_eq!(
            subnet.cell(subnet.links_of(subnet.output(0))[0].idx()).symbol,
            veles_subnet::CellSymbol::Zero
        );
        assert_eq!(subnet.depth(), 0);
    }

    #[test]
    fn single_variable_is_tiny() {
        let f = TruthTable::nth_var(3, 2);
        let subnet = ZhegalkinSynthesizer.synthesize_exact(&f).unwrap();
        assert!(subnet.internal_count() <= 1);
        assert_eq!(evaluate_single_out(&subnet), f);
    }

    #[test]
    fn zoo_roundtrip() {
        for f in zoo() {
            check(
                &ZhegalkinSynthesizer,
                &f,
                &TruthTable::ones(f.num_vars()),
                crate::NO_ARITY_BOUND,
            );
        }
    }

    #[test]
    fn max_arity_two_respected() {
        let f = TruthTable::from_bits(4, 0x6996);
        let subnet = ZhegalkinSynthesizer
            .synthesize(&f, &TruthTable::ones(4), 2)
            .unwrap();
        for (idx, cell) in subnet.iter() {
            if cell.symbol.is_gate() {
                assert!(subnet.links_of(idx).len() <= 2);
            }
        }
        assert_eq!(evaluate_single_out(&subnet), f);
    }
}
