//! Named passes, predefined scripts, and design-level execution.

use crate::activity::ActivityEstimator;
use crate::balance::Balancer;
use crate::refactor::Refactorer;
use crate::resub::Resubstitutor;
use crate::rewrite::Rewriter;
use crate::sweep::Sweeper;
use crate::transform::{SubnetTransform, TransformChain};
use rayon::prelude::*;
use veles_subnet::{DesignBuilder, SubnetBuilder};

/// Builds a fresh pass instance per subnet, so passes with interior
/// mutability (the rewriter's NPN4 cache) can run on subnets in parallel.
pub type PassFactory = Box<dyn Fn() -> Box<dyn SubnetTransform> + Send + Sync>;

/// The power-aware refactor needs activities in the weights first.
struct PowerRefactor;

impl SubnetTransform for PowerRefactor {
    fn name(&self) -> &str {
        "rfp"
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        ActivityEstimator::new().estimate(builder);
        Refactorer::power().transform(builder);
    }
}

/// Resolves a single pass name with its numeric options.
///
/// `k` parameterizes the cut bound of `rw`/`rs`; `zero_cost` selects the
/// `-z` flavor where one exists.
pub fn by_name(name: &str, k: Option<usize>, zero_cost: bool) -> Option<PassFactory> {
    let factory: PassFactory = match name {
        "b" => Box::new(|| Box::new(Balancer)),
        "sw" => Box::new(|| Box::new(Sweeper)),
        "rw" => {
            let k = k.unwrap_or(4);
            Box::new(move || Box::new(Rewriter::new(k, zero_cost)))
        }
        "rwz" => {
            let k = k.unwrap_or(4);
            Box::new(move || Box::new(Rewriter::new(k, true)))
        }
        "rf" => Box::new(|| Box::new(Refactorer::new())),
        "rfz" => Box::new(|| Box::new(Refactorer::zero_cost())),
        "rfa" => Box::new(|| Box::new(Refactorer::area())),
        "rfd" => Box::new(|| Box::new(Refactorer::depth())),
        "rfp" => Box::new(|| Box::new(PowerRefactor)),
        "rs" => {
            let k = k.unwrap_or(8);
            Box::new(move || Box::new(Resubstitutor::new(k)))
        }
        "rsz" => {
            let k = k.unwrap_or(8);
            Box::new(move || Box::new(Resubstitutor::zero_cost(k)))
        }
        _ => return None,
    };
    Some(factory)
}

fn pass(name: &'static str, k: Option<usize>) -> Box<dyn SubnetTransform> {
    by_name(name, k, false).expect("known pass")()
}

/// Resolves a predefined script name into a pass chain.
pub fn script(name: &str) -> Option<Box<dyn SubnetTransform>> {
    let passes: Vec<Box<dyn SubnetTransform>> = match name {
        // resyn: b; rw; rwz; b; rwz; b
        "resyn" => vec![
            pass("b", None),
            pass("rw", None),
            pass("rwz", None),
            pass("b", None),
            pass("rwz", None),
            pass("b", None),
        ],
        // resyn2: b; rw; rf; b; rw; rwz; b; rfz; b
        "resyn2" => vec![
            pass("b", None),
            pass("rw", None),
            pass("rf", None),
            pass("b", None),
            pass("rw", None),
            pass("rwz", None),
            pass("b", None),
            pass("rfz", None),
            pass("b", None),
        ],
        // resyn2a: b; rw; b; rw; rwz; b; rwz; b
        "resyn2a" => vec![
            pass("b", None),
            pass("rw", None),
            pass("b", None),
            pass("rw", None),
            pass("rwz", None),
            pass("b", None),
            pass("rwz", None),
            pass("b", None),
        ],
        // resyn3: b; rs; rs -K 6; b; rsz; rsz -K 6; b; rsz -K 5; b
        "resyn3" => vec![
            pass("b", None),
            pass("rs", None),
            pass("rs", Some(6)),
            pass("b", None),
            pass("rsz", None),
            pass("rsz", Some(6)),
            pass("b", None),
            pass("rsz", Some(5)),
            pass("b", None),
        ],
        // compress: b; rw; rwz; b; rwz; b
        "compress" => vec![
            pass("b", None),
            pass("rw", None),
            pass("rwz", None),
            pass("b", None),
            pass("rwz", None),
            pass("b", None),
        ],
        // compress2: b; rw; rf; b; rw; rwz; b; rfz; rwz; b
        "compress2" => vec![
            pass("b", None),
            pass("rw", None),
            pass("rf", None),
            pass("b", None),
            pass("rw", None),
            pass("rwz", None),
            pass("b", None),
            pass("rfz", None),
            pass("rwz", None),
            pass("b", None),
        ],
        _ => return None,
    };
    Some(Box::new(TransformChain::new(name.to_string(), passes)))
}

/// Runs a pass over every subnet of a design, subnets in parallel, each
/// pass instance private to its subnet (passes stay single-threaded
/// within one subnet).
pub fn run_on_design(design: &mut DesignBuilder, factory: &PassFactory) {
    design.builders_mut().par_iter_mut().for_each(|builder| {
        factory().transform(builder);
    });
}

/// Runs a named script over every subnet of a design.
pub fn run_script_on_design(design: &mut DesignBuilder, name: &str) -> bool {
    if script(name).is_none() {
        return false;
    }
    design.builders_mut().par_iter_mut().for_each(|builder| {
        script(name).expect("checked above").transform(builder);
    });
    true
}
