//! Sequential sweep: stuck registers collapse to constants.

use crate::transform::SubnetTransform;
use veles_subnet::{CellSymbol, InOutMapping, SafePasser, SubnetBuilder};

/// The `sw` pass.
///
/// A register or latch whose data input is a constant holds a stuck value;
/// its fanouts move onto the constant and the state element is collected.
/// Feedback loops that tie a state element's data to its own output live
/// at the net level and reach the subnet already broken into a constant
/// data input by the frontend.
pub struct Sweeper;

/// The position of the data pin per state-element symbol:
/// `(clock/enable, data, ...)`.
fn data_pin(symbol: CellSymbol) -> Option<usize> {
    match symbol {
        CellSymbol::Dff
        | CellSymbol::SDff
        | CellSymbol::ADff
        | CellSymbol::DffRs
        | CellSymbol::DLatch
        | CellSymbol::ADLatch
        | CellSymbol::DLatchRs => Some(1),
        _ => None,
    }
}

impl SubnetTransform for Sweeper {
    fn name(&self) -> &str {
        "sw"
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        let mut passer = SafePasser::new();
        let mut swept = 0usize;
        while let Some(entry) = passer.next(builder) {
            let symbol = builder.symbol(entry);
            let Some(pin) = data_pin(symbol) else {
                continue;
            };
            if builder.links_of(entry).len() <= pin {
                continue;
            }
            let data = builder.link(entry, pin);
            let constant = match builder.symbol(data.idx()) {
                CellSymbol::Zero => Some(data.is_inv()),
                CellSymbol::One => Some(!data.is_inv()),
                _ => None,
            };
            let Some(value) = constant else {
                continue;
            };

            let mut rhs = SubnetBuilder::new();
            rhs.add_input();
            let symbol = if value {
                CellSymbol::One
            } else {
                CellSymbol::Zero
            };
            let link = rhs.add_cell(symbol, &[]);
            rhs.add_output(link);
            let rhs = rhs.make(false);
            builder.replace(
                &rhs,
                &InOutMapping::new(vec![data.idx()], vec![entry]),
            );
            swept += 1;
        }
        tracing::debug!(swept, "sequential sweep done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_subnet::eval::evaluate_single_out;

    #[test]
    fn stuck_latch_becomes_a_constant() {
        let mut builder = SubnetBuilder::new();
        let clk = builder.add_input();
        let a = builder.add_input();
        let zero = builder.add_cell(CellSymbol::Zero, &[]);
        let latch = builder.add_cell(CellSymbol::DLatch, &[clk, zero]);
        let root = builder.add_cell(CellSymbol::Or, &[latch, a]);
        builder.add_output(root);
        let depth_before = builder.max_depth();

        Sweeper.transform(&mut builder);

        assert!(builder.is_dead(latch.idx()), "the latch must be swept");
        assert!(builder.max_depth() <= depth_before);
        // or(0, a) collapses to the wire a once the constant propagates.
        let tt = evaluate_single_out(&builder.make(true));
        assert_eq!(tt, veles_tt::TruthTable::nth_var(2, 1));
    }

    #[test]
    fn inverted_constant_data_sweeps_to_one() {
        let mut builder = SubnetBuilder::new();
        let clk = builder.add_input();
        let zero = builder.add_cell(CellSymbol::Zero, &[]);
        let dff = builder.add_cell(CellSymbol::Dff, &[clk, !zero]);
        builder.add_output(dff);

        Sweeper.transform(&mut builder);

        let subnet = builder.make(true);
        let driver = subnet.links_of(subnet.output(0))[0];
        assert_eq!(subnet.cell(driver.idx()).symbol, CellSymbol::One);
    }

    #[test]
    fn live_registers_survive() {
        let mut builder = SubnetBuilder::new();
        let clk = builder.add_input();
        let d = builder.add_input();
        let dff = builder.add_cell(CellSymbol::Dff, &[clk, d]);
        builder.add_output(dff);

        Sweeper.transform(&mut builder);

        assert!(!builder.is_dead(dff.idx()));
    }
}
