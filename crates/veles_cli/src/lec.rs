//! Logical equivalence checking between save points.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use veles_subnet::{eval::evaluate, CellSymbol, Subnet};

/// The outcome of an equivalence check.
///
/// `Unknown` is the one place a third verdict exists: the chosen method
/// ran out of capacity (too many inputs for exhaustive evaluation, or an
/// external oracle is not wired in).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EquivResult {
    /// The designs agree on every checked assignment.
    Equal,
    /// A counterexample was found.
    NotEqual,
    /// The method could not decide.
    Unknown,
}

/// The checking method selected by `lec --method`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LecMethod {
    /// Exhaustive evaluation through the truth-table engine.
    Bdd,
    /// Fraiging; consumed as an external oracle and not bundled.
    Fra,
    /// Random bit-parallel simulation.
    Rnd,
    /// SAT; falls back to exhaustive evaluation within capacity.
    Sat,
}

impl LecMethod {
    /// Parses the `--method` argument.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bdd" => Some(LecMethod::Bdd),
            "fra" => Some(LecMethod::Fra),
            "rnd" => Some(LecMethod::Rnd),
            "sat" => Some(LecMethod::Sat),
            _ => None,
        }
    }
}

/// Exhaustive evaluation is bounded by table growth (2^n bits per node).
const EXHAUSTIVE_INPUT_LIMIT: usize = 16;
/// Random simulation rounds (64 patterns per round).
const RND_ROUNDS: usize = 256;

/// Checks two frozen subnets for equivalence.
pub fn check_subnets(a: &Subnet, b: &Subnet, method: LecMethod) -> EquivResult {
    if a.input_count() != b.input_count() || a.output_count() != b.output_count() {
        return EquivResult::NotEqual;
    }
    match method {
        LecMethod::Bdd | LecMethod::Sat => {
            if a.input_count() > EXHAUSTIVE_INPUT_LIMIT {
                return EquivResult::Unknown;
            }
            if evaluate(a) == evaluate(b) {
                EquivResult::Equal
            } else {
                EquivResult::NotEqual
            }
        }
        LecMethod::Rnd => random_check(a, b),
        LecMethod::Fra => EquivResult::Unknown,
    }
}

/// Checks matched lists of subnets (one per design island).
pub fn check_designs(a: &[Subnet], b: &[Subnet], method: LecMethod) -> EquivResult {
    if a.len() != b.len() {
        return EquivResult::NotEqual;
    }
    let mut verdict = EquivResult::Equal;
    for (left, right) in a.iter().zip(b.iter()) {
        match check_subnets(left, right, method) {
            EquivResult::NotEqual => return EquivResult::NotEqual,
            EquivResult::Unknown => verdict = EquivResult::Unknown,
            EquivResult::Equal => {}
        }
    }
    verdict
}

fn simulate(subnet: &Subnet, inputs: &[u64]) -> Option<Vec<u64>> {
    let mut values: Vec<u64> = vec![0; subnet.size()];
    for (idx, cell) in subnet.iter() {
        let fanins: Vec<u64> = subnet
            .links_of(idx)
            .iter()
            .map(|l| {
                let v = values[l.idx()];
                if l.is_inv() {
                    !v
                } else {
                    v
                }
            })
            .collect();
        values[idx] = match cell.symbol {
            CellSymbol::In => inputs[idx],
            CellSymbol::Zero => 0,
            CellSymbol::One => u64::MAX,
            CellSymbol::Buf | CellSymbol::Not | CellSymbol::Out => fanins[0],
            CellSymbol::And | CellSymbol::Nand => {
                let v = fanins.iter().fold(u64::MAX, |a, &b| a & b);
                if cell.symbol == CellSymbol::Nand {
                    !v
                } else {
                    v
                }
            }
            CellSymbol::Or | CellSymbol::Nor => {
                let v = fanins.iter().fold(0, |a, &b| a | b);
                if cell.symbol == CellSymbol::Nor {
                    !v
                } else {
                    v
                }
            }
            CellSymbol::Xor | CellSymbol::Xnor => {
                let v = fanins.iter().fold(0, |a, &b| a ^ b);
                if cell.symbol == CellSymbol::Xnor {
                    !v
                } else {
                    v
                }
            }
            CellSymbol::Maj => {
                let mut v = 0u64;
                for bit in 0..64 {
                    let ones = fanins.iter().filter(|f| *f >> bit & 1 == 1).count();
                    if ones > fanins.len() / 2 {
                        v |= 1 << bit;
                    }
                }
                v
            }
            CellSymbol::Mux2 => (fanins[0] & fanins[1]) | (!fanins[0] & fanins[2]),
            _ => return None,
        };
    }
    Some(
        (0..subnet.output_count())
            .map(|j| values[subnet.output(j)])
            .collect(),
    )
}

/// Bit-parallel random simulation: a clean sweep reports `Equal`
/// (probabilistically), any mismatch is a hard counterexample.
fn random_check(a: &Subnet, b: &Subnet) -> EquivResult {
    let mut rng = StdRng::seed_from_u64(0x1ec0_cafe);
    for _ in 0..RND_ROUNDS {
        let inputs: Vec<u64> = (0..a.input_count()).map(|_| rng.gen()).collect();
        let left = simulate(a, &inputs);
        let right = simulate(b, &inputs);
        match (left, right) {
            (Some(left), Some(right)) => {
                if left != right {
                    return EquivResult::NotEqual;
                }
            }
            _ => return EquivResult::Unknown,
        }
    }
    EquivResult::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::SubnetBuilder;

    fn and_subnet() -> Subnet {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let and = builder.add_cell(CellSymbol::And, &[a, b]);
        builder.add_output(and);
        builder.make(true)
    }

    fn nand_of_inverted() -> Subnet {
        // ~(~a | ~b) == a & b via De Morgan, structurally different.
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let or = builder.add_cell(CellSymbol::Or, &[!a, !b]);
        builder.add_output(!or);
        builder.make(true)
    }

    fn or_subnet() -> Subnet {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        let b = builder.add_input();
        let or = builder.add_cell(CellSymbol::Or, &[a, b]);
        builder.add_output(or);
        builder.make(true)
    }

    #[test]
    fn equivalent_structures_pass_all_methods() {
        for method in [LecMethod::Bdd, LecMethod::Sat, LecMethod::Rnd] {
            assert_eq!(
                check_subnets(&and_subnet(), &nand_of_inverted(), method),
                EquivResult::Equal,
                "{method:?}"
            );
        }
    }

    #[test]
    fn different_functions_fail() {
        for method in [LecMethod::Bdd, LecMethod::Sat, LecMethod::Rnd] {
            assert_eq!(
                check_subnets(&and_subnet(), &or_subnet(), method),
                EquivResult::NotEqual,
                "{method:?}"
            );
        }
    }

    #[test]
    fn fraiging_is_an_external_oracle() {
        assert_eq!(
            check_subnets(&and_subnet(), &and_subnet(), LecMethod::Fra),
            EquivResult::Unknown
        );
    }

    #[test]
    fn mismatched_interfaces_differ() {
        let mut builder = SubnetBuilder::new();
        let a = builder.add_input();
        builder.add_output(a);
        let wire = builder.make(true);
        assert_eq!(
            check_subnets(&and_subnet(), &wire, LecMethod::Bdd),
            EquivResult::NotEqual
        );
    }

    #[test]
    fn design_lists_combine_verdicts() {
        let a = vec![and_subnet(), or_subnet()];
        let b = vec![nand_of_inverted(), or_subnet()];
        assert_eq!(check_designs(&a, &b, LecMethod::Bdd), EquivResult::Equal);
        let c = vec![and_subnet(), and_subnet()];
        assert_eq!(check_designs(&a, &c, LecMethod::Bdd), EquivResult::NotEqual);
    }

    #[test]
    fn method_names_parse() {
        assert_eq!(LecMethod::parse("bdd"), Some(LecMethod::Bdd));
        assert_eq!(LecMethod::parse("sat"), Some(LecMethod::Sat));
        assert_eq!(LecMethod::parse("rnd"), Some(LecMethod::Rnd));
        assert_eq!(LecMethod::parse("fra"), Some(LecMethod::Fra));
        assert_eq!(LecMethod::parse("magic"), None);
    }
}
