//! Maximum fanout-free cone construction.

use std::collections::HashMap;
use veles_subnet::{InOutMapping, SubnetBuilder, SubnetFragment, SubnetView};

/// Computes the MFFC of `root` limited by `leaves` and returns it as a
/// view: its inputs are the cone bounds, its single output is the root.
///
/// Two passes over the cone: the first hypothetically dereferences every
/// cell below the root (leaves keep their counts), the second walks down
/// again and turns every cell that kept an external reference into a
/// bound. Cells whose count reached zero are owned by the root and stay
/// inside the cone.
pub fn mffc_view(builder: &mut SubnetBuilder, root: usize, leaves: &[usize]) -> SubnetView {
    assert!(!leaves.is_empty(), "bounds for a fanout-free cone are empty");

    let mut refs: HashMap<usize, u32> = HashMap::new();
    builder.start_session();
    for &leaf in leaves {
        builder.mark(leaf);
    }
    deref_cells(builder, root, &mut refs);

    builder.start_session();
    let mut bounds = Vec::new();
    collect_bounds(builder, root, &refs, &mut bounds);

    SubnetView::new(InOutMapping::new(bounds, vec![root]))
}

/// The builder entries owned by the MFFC of `root`: the root plus every
/// cone cell whose references all vanish when the root is replaced.
pub fn mffc_interior(builder: &mut SubnetBuilder, root: usize, leaves: &[usize]) -> Vec<usize> {
    assert!(!leaves.is_empty(), "bounds for a fanout-free cone are empty");

    let mut refs: HashMap<usize, u32> = HashMap::new();
    builder.start_session();
    for &leaf in leaves {
        builder.mark(leaf);
    }
    deref_cells(builder, root, &mut refs);

    let mut interior = vec![root];
    let mut stack = vec![root];
    while let Some(at) = stack.pop() {
        for link in builder.links_of(at) {
            let target = link.idx();
            if refs.get(&target) == Some(&0) && !interior.contains(&target) {
                interior.push(target);
                stack.push(target);
            }
        }
    }
    interior
}

/// The MFFC extracted as a standalone fragment.
pub fn mffc_fragment(
    builder: &mut SubnetBuilder,
    root: usize,
    leaves: &[usize],
) -> SubnetFragment {
    let view = mffc_view(builder, root, leaves);
    view.extract(builder)
}

fn deref_cells(builder: &SubnetBuilder, at: usize, refs: &mut HashMap<usize, u32>) {
    for link in builder.links_of(at) {
        let target = link.idx();
        refs.entry(target).or_insert_with(|| builder.refcount(target));
        if builder.is_marked(target) {
            continue;
        }
        let count = refs.get_mut(&target).expect("inserted above");
        *count -= 1;
        if *count == 0 {
            deref_cells(builder, target, refs);
        }
    }
}

fn collect_bounds(
    builder: &mut SubnetBuilder,
    at: usize,
    refs: &HashMap<usize, u32>,
    bounds: &mut Vec<usize>,
) {
    let targets: Vec<usize> = builder.links_of(at).iter().map(|l| l.idx()).collect();
    for target in targets {
        if builder.is_marked(target) || builder.symbol(target).is_constant() {
            continue;
        }
        builder.mark(target);
        let remaining = refs
            .get(&target)
            .copied()
            .unwrap_or_else(|| builder.refcount(target));
        if remaining == 0 {
            collect_bounds(builder, target, refs, bounds);
        } else {
            bounds.push(target);
        }
    }
}
