//! The Veles transformer pipeline.
//!
//! In-place subnet passes (balance, rewrite, refactor, resubstitute), the
//! replacement policies that gate them, the named pass scripts exposed by
//! the shell, and the switching-activity estimator feeding power-aware
//! passes.

#![warn(missing_docs)]

pub mod activity;
pub mod balance;
pub mod iterator;
pub mod passes;
pub mod refactor;
pub mod replace;
pub mod resub;
pub mod rewrite;
pub mod sweep;
pub mod transform;

pub use activity::ActivityEstimator;
pub use balance::Balancer;
pub use iterator::{AreaSubnetIterator, DepthSubnetIterator, SubnetIterator};
pub use passes::{by_name, run_on_design, run_script_on_design, script, PassFactory};
pub use refactor::{RefactorObjective, Refactorer};
pub use replace::{AreaReplacer, DepthReplacer, GainReplacer, Replacer};
pub use resub::Resubstitutor;
pub use rewrite::Rewriter;
pub use sweep::Sweeper;
pub use transform::{SubnetTransform, TransformChain};
