//! A builder iterator stable under in-place replacement.

use crate::builder::SubnetBuilder;

/// A bidirectional cursor over a builder's topological order.
///
/// The passer stays valid across `replace` calls that happen at or after
/// its current position: replacement cells are spliced into the order
/// before the replaced root, the root itself goes dead and is skipped, and
/// the cursor keeps walking from where it stood. Mutations strictly before
/// the current position may move cells the passer has already visited and
/// are outside the contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafePasser {
    current: Option<usize>,
    started: bool,
}

impl SafePasser {
    /// A passer positioned before the first entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry the passer currently stands on.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Advances to the next live entry and returns it.
    pub fn next(&mut self, builder: &SubnetBuilder) -> Option<usize> {
        let next = if !self.started {
            self.started = true;
            builder.order_first()
        } else {
            match self.current {
                Some(at) => builder.order_after(at),
                None => None,
            }
        };
        self.current = next;
        next
    }

    /// Steps back to the previous live entry and returns it.
    pub fn prev(&mut self, builder: &SubnetBuilder) -> Option<usize> {
        let prev = match self.current {
            Some(at) => builder.order_before(at),
            None => None,
        };
        if prev.is_some() {
            self.current = prev;
        }
        prev
    }
}
