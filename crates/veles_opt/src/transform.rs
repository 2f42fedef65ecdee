//! The in-place transformer contract.

use veles_subnet::SubnetBuilder;

/// A pass that rewrites a subnet builder in place.
pub trait SubnetTransform {
    /// The pass name shown in logs and the shell.
    fn name(&self) -> &str;

    /// Applies the pass to the builder.
    fn transform(&self, builder: &mut SubnetBuilder);
}

/// A sequential composition of passes.
pub struct TransformChain {
    name: String,
    passes: Vec<Box<dyn SubnetTransform>>,
}

impl TransformChain {
    /// Builds a named chain.
    pub fn new(name: impl Into<String>, passes: Vec<Box<dyn SubnetTransform>>) -> Self {
        Self {
            name: name.into(),
            passes,
        }
    }
}

impl SubnetTransform for TransformChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, builder: &mut SubnetBuilder) {
        for pass in &self.passes {
            let before = builder.live_internal_count();
            pass.transform(builder);
            tracing::debug!(
                pass = pass.name(),
                before,
                after = builder.live_internal_count(),
                "pass finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingPass;

    impl SubnetTransform for CountingPass {
        fn name(&self) -> &str {
            "count"
        }

        fn transform(&self, builder: &mut SubnetBuilder) {
            // Appends one dangling input per invocation.
            builder.add_input();
        }
    }

    #[test]
    fn chain_runs_passes_in_order() {
        let chain = TransformChain::new(
            "twice",
            vec![Box::new(CountingPass), Box::new(CountingPass)],
        );
        let mut builder = SubnetBuilder::new();
        chain.transform(&mut builder);
        assert_eq!(builder.inputs().len(), 2);
        assert_eq!(chain.name(), "twice");
    }
}
