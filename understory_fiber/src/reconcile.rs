// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional child reconciliation.
//!
//! The old child chain (the alternate's children) and the new element list are
//! walked in lockstep by index. Children are never matched by key, so an
//! insertion or removal in the middle of a list shifts every following
//! position.

use alloc::vec::Vec;

use crate::element::Element;
use crate::fiber::{Fiber, FiberTree};
use crate::types::{EffectTag, FiberId};

/// Build the child chain of `wip` from `elements`.
///
/// At each index:
/// - an old fiber whose kind matches the element yields an [`EffectTag::Update`]
///   fiber that reuses the old host node, with `alternate` set to the old fiber;
/// - an element with no matching old fiber yields an [`EffectTag::Create`] fiber;
/// - an old fiber with no matching element is tagged [`EffectTag::Delete`] and
///   pushed onto `deletions`. It stays in the committed tree.
pub(crate) fn reconcile_children<N: Copy>(
    tree: &mut FiberTree<N>,
    wip: FiberId,
    elements: &[Element],
    deletions: &mut Vec<FiberId>,
) {
    let mut old = tree.alternate(wip).and_then(|alt| tree.child(alt));
    let mut prev: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let same_kind = match (old, element) {
            (Some(o), Some(e)) => tree.get(o).kind.matches(e.kind()),
            _ => false,
        };

        let new_fiber = match (old, element) {
            (Some(o), Some(element)) if same_kind => {
                let mut fiber = Fiber::from_element(element, wip, EffectTag::Update);
                fiber.node = tree.get(o).node;
                fiber.alternate = Some(o);
                Some(fiber)
            }
            (_, Some(element)) => Some(Fiber::from_element(element, wip, EffectTag::Create)),
            (_, None) => None,
        };

        if let Some(o) = old
            && !same_kind
        {
            tree.get_mut(o).effect = EffectTag::Delete;
            deletions.push(o);
        }

        if let Some(fiber) = new_fiber {
            let id = tree.insert(fiber);
            tracing::trace!(?id, effect = ?tree.get(id).effect, index, "reconciled child");
            match prev {
                None => tree.get_mut(wip).child = Some(id),
                Some(p) => tree.get_mut(p).sibling = Some(id),
            }
            prev = Some(id);
        }

        old = old.and_then(|o| tree.sibling(o));
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use crate::fiber::FiberKind;
    use alloc::rc::Rc;
    use alloc::vec;

    fn li(text: &str) -> Element {
        Element::host("li").prop("title", text).child(text).build()
    }

    /// Reconcile `elements` under a fresh root and pretend it committed.
    fn committed(tree: &mut FiberTree<u32>, elements: &[Element]) -> FiberId {
        let root = tree.insert(Fiber::root(0, Rc::from(elements), None));
        let mut deletions = Vec::new();
        reconcile_children(tree, root, elements, &mut deletions);
        assert!(deletions.is_empty());
        let mut node = 1;
        for child in tree.children(root).collect::<Vec<_>>() {
            tree.get_mut(child).node = Some(node);
            tree.get_mut(child).effect = EffectTag::None;
            node += 1;
        }
        root
    }

    fn effects(tree: &FiberTree<u32>, parent: FiberId) -> Vec<EffectTag> {
        tree.children(parent)
            .map(|c| tree.effect_tag(c).unwrap())
            .collect()
    }

    #[test]
    fn first_render_creates_everything() {
        let mut tree = FiberTree::new();
        let elements = [li("a"), li("b")];
        let root = tree.insert(Fiber::root(0_u32, Rc::from(&elements[..]), None));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, root, &elements, &mut deletions);
        assert_eq!(effects(&tree, root), vec![EffectTag::Create, EffectTag::Create]);
        assert!(tree.children(root).all(|c| tree.host_node(c).is_none()));
        assert!(tree.children(root).all(|c| tree.alternate(c).is_none()));
    }

    #[test]
    fn removing_the_middle_item_shifts_positions() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[li("a"), li("b"), li("c")]);
        let old: Vec<_> = tree.children(old_root).collect();

        let elements = [li("a"), li("c")];
        let root = tree.insert(Fiber::root(0, Rc::from(&elements[..]), Some(old_root)));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, root, &elements, &mut deletions);

        let new: Vec<_> = tree.children(root).collect();
        assert_eq!(effects(&tree, root), vec![EffectTag::Update, EffectTag::Update]);
        assert_eq!(tree.alternate(new[1]), Some(old[1]));
        assert_eq!(tree.host_node(new[1]), Some(2), "position 1 keeps its node");
        assert_eq!(tree.props(new[1]).unwrap().get_str("title"), Some("c"));
        assert_eq!(deletions, vec![old[2]]);
        assert_eq!(tree.effect_tag(old[2]), Some(EffectTag::Delete));
        assert_eq!(tree.effect_tag(old[1]), Some(EffectTag::None));
    }

    #[test]
    fn kind_change_replaces() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[Element::host("div").build()]);
        let old = tree.child(old_root).unwrap();

        let elements = [Element::host("span").build()];
        let root = tree.insert(Fiber::root(0, Rc::from(&elements[..]), Some(old_root)));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, root, &elements, &mut deletions);

        let new = tree.child(root).unwrap();
        assert_eq!(tree.effect_tag(new), Some(EffectTag::Create));
        assert_eq!(tree.kind(new), Some(&FiberKind::Host("span".into())));
        assert_eq!(tree.host_node(new), None);
        assert_eq!(tree.alternate(new), None);
        assert_eq!(deletions, vec![old]);
    }

    #[test]
    fn appended_children_are_created() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[li("a")]);

        let elements = [li("a"), Element::text("tail")];
        let root = tree.insert(Fiber::root(0, Rc::from(&elements[..]), Some(old_root)));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, root, &elements, &mut deletions);

        assert_eq!(effects(&tree, root), vec![EffectTag::Update, EffectTag::Create]);
        assert!(deletions.is_empty());
        let last = tree.children(root).last().unwrap();
        assert_eq!(tree.parent(last), Some(root));
        assert_eq!(tree.props(last), Some(&Props::new().with("nodeValue", "tail")));
    }

    #[test]
    fn emptied_list_deletes_all() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[li("a"), li("b")]);
        let root = tree.insert(Fiber::root(0, Rc::from([]), Some(old_root)));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, root, &[], &mut deletions);
        assert_eq!(tree.child(root), None);
        assert_eq!(deletions.len(), 2);
    }
}
