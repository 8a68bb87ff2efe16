//! Tree diffing.
//!
//! # Algorithm
//!
//! Nodes are compared structurally:
//!
//! - Text vs text: emit `SetText` when the content differs.
//! - Element vs element with the same tag: diff props, then children.
//! - Child reference vs child reference to the same instance: nothing to
//!   do here; the child's own commit produced its patches.
//! - Anything else: `Replace`.
//!
//! Plain children diff positionally. Keyed children build a mapping from
//! key to previous child, walk the new list in order, and emit
//! `MoveChild`/`InsertChild`/`RemoveChild` against a simulated sibling
//! list so every index refers to the list as the host sees it at that
//! point in the patch stream. Matched keys recurse.

use std::collections::{HashMap, HashSet};

use crate::component::InstanceId;
use crate::view::{HostChildren, HostNode, Key, Props};

use super::patch::{NodePath, PatchOp, PatchSet};

/// Diff two committed trees of one instance into a fresh patch set.
pub fn reconcile(instance: InstanceId, old: &HostNode, new: &HostNode) -> PatchSet {
    let mut out = PatchSet::new();
    diff_into(instance, old, new, &mut out);
    out
}

/// Diff two committed trees, appending to an existing patch set.
pub(crate) fn diff_into(instance: InstanceId, old: &HostNode, new: &HostNode, out: &mut PatchSet) {
    let mut path = NodePath::new();
    diff_node(instance, &mut path, old, new, out);
}

fn diff_node(
    instance: InstanceId,
    path: &mut NodePath,
    old: &HostNode,
    new: &HostNode,
    out: &mut PatchSet,
) {
    match (old, new) {
        (HostNode::Text { value: before }, HostNode::Text { value: after }) => {
            if before != after {
                out.push(
                    instance,
                    path.clone(),
                    PatchOp::SetText {
                        value: after.clone(),
                    },
                );
            }
        }
        (
            HostNode::Element {
                tag: old_tag,
                props: old_props,
                children: old_children,
            },
            HostNode::Element {
                tag: new_tag,
                props: new_props,
                children: new_children,
            },
        ) if old_tag == new_tag => {
            diff_props(instance, path, old_props, new_props, out);
            match (old_children, new_children) {
                (HostChildren::Plain(before), HostChildren::Plain(after)) => {
                    diff_plain(instance, path, before, after, out);
                }
                (HostChildren::Keyed(before), HostChildren::Keyed(after)) => {
                    diff_keyed(instance, path, before, after, out);
                }
                // The collection changed mode; rebuild the element.
                _ => out.push(
                    instance,
                    path.clone(),
                    PatchOp::Replace { node: new.clone() },
                ),
            }
        }
        (HostNode::Child { instance: before }, HostNode::Child { instance: after })
            if before == after => {}
        _ => out.push(
            instance,
            path.clone(),
            PatchOp::Replace { node: new.clone() },
        ),
    }
}

fn diff_props(
    instance: InstanceId,
    path: &NodePath,
    old: &Props,
    new: &Props,
    out: &mut PatchSet,
) {
    for (name, value) in new.iter() {
        if old.get(name) != Some(value) {
            out.push(
                instance,
                path.clone(),
                PatchOp::SetProp {
                    name: name.clone(),
                    value: value.clone(),
                },
            );
        }
    }
    for (name, _) in old.iter() {
        if new.get(name).is_none() {
            out.push(
                instance,
                path.clone(),
                PatchOp::RemoveProp { name: name.clone() },
            );
        }
    }
}

fn diff_plain(
    instance: InstanceId,
    path: &mut NodePath,
    old: &[HostNode],
    new: &[HostNode],
    out: &mut PatchSet,
) {
    let shared = old.len().min(new.len());
    for index in 0..shared {
        path.push(index as u32);
        diff_node(instance, path, &old[index], &new[index], out);
        path.pop();
    }
    for (index, node) in new.iter().enumerate().skip(shared) {
        out.push(
            instance,
            path.clone(),
            PatchOp::InsertChild {
                index: index as u32,
                key: None,
                node: node.clone(),
            },
        );
    }
    for index in (shared..old.len()).rev() {
        out.push(
            instance,
            path.clone(),
            PatchOp::RemoveChild {
                index: index as u32,
            },
        );
    }
}

fn diff_keyed(
    instance: InstanceId,
    path: &mut NodePath,
    old: &[(Key, HostNode)],
    new: &[(Key, HostNode)],
    out: &mut PatchSet,
) {
    let old_by_key: HashMap<&Key, &HostNode> =
        old.iter().map(|(key, node)| (key, node)).collect();
    let new_keys: HashSet<&Key> = new.iter().map(|(key, _)| key).collect();

    // Simulated sibling list, kept in step with the emitted ops so every
    // index matches what the host sees when the op arrives.
    let mut sim: Vec<&Key> = old.iter().map(|(key, _)| key).collect();

    // Drop vanished keys back to front so earlier indices stay stable.
    for index in (0..old.len()).rev() {
        let key = &old[index].0;
        if !new_keys.contains(key) {
            out.push(
                instance,
                path.clone(),
                PatchOp::RemoveChild {
                    index: index as u32,
                },
            );
            sim.remove(index);
        }
    }

    for (index, (key, new_node)) in new.iter().enumerate() {
        match sim.iter().position(|existing| *existing == key) {
            None => {
                out.push(
                    instance,
                    path.clone(),
                    PatchOp::InsertChild {
                        index: index as u32,
                        key: Some(key.clone()),
                        node: new_node.clone(),
                    },
                );
                sim.insert(index, key);
            }
            Some(from) => {
                if from != index {
                    out.push(
                        instance,
                        path.clone(),
                        PatchOp::MoveChild {
                            from: from as u32,
                            to: index as u32,
                        },
                    );
                    let moved = sim.remove(from);
                    sim.insert(index, moved);
                }
                if let Some(old_node) = old_by_key.get(key) {
                    path.push(index as u32);
                    diff_node(instance, path, old_node, new_node, out);
                    path.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Props;

    fn text(value: &str) -> HostNode {
        HostNode::Text {
            value: value.into(),
        }
    }

    fn list(entries: Vec<(&str, HostNode)>) -> HostNode {
        HostNode::Element {
            tag: "ul".into(),
            props: Props::new(),
            children: HostChildren::Keyed(
                entries
                    .into_iter()
                    .map(|(key, node)| (Key::from(key), node))
                    .collect(),
            ),
        }
    }

    fn row(children: Vec<HostNode>) -> HostNode {
        HostNode::Element {
            tag: "div".into(),
            props: Props::new(),
            children: HostChildren::Plain(children),
        }
    }

    #[test]
    fn identical_trees_produce_no_patches() {
        let instance = InstanceId::next();
        let tree = row(vec![text("a"), list(vec![("x", text("x"))])]);
        let patches = reconcile(instance, &tree, &tree.clone());
        assert!(patches.is_empty());
    }

    #[test]
    fn text_change_patches_in_place() {
        let instance = InstanceId::next();
        let old = row(vec![text("before")]);
        let new = row(vec![text("after")]);

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches.patches[0].path, vec![0]);
        assert_eq!(
            patches.patches[0].op,
            PatchOp::SetText {
                value: "after".into()
            }
        );
    }

    #[test]
    fn prop_changes_are_granular() {
        let instance = InstanceId::next();
        let old = HostNode::Element {
            tag: "div".into(),
            props: Props::new().with("class", "a").with("title", "t"),
            children: HostChildren::Plain(Vec::new()),
        };
        let new = HostNode::Element {
            tag: "div".into(),
            props: Props::new().with("class", "b").with("role", "row"),
            children: HostChildren::Plain(Vec::new()),
        };

        let patches = reconcile(instance, &old, &new);
        let ops: Vec<&PatchOp> = patches.patches.iter().map(|p| &p.op).collect();
        assert_eq!(ops.len(), 3);
        assert!(ops.contains(&&PatchOp::SetProp {
            name: "class".into(),
            value: "b".into()
        }));
        assert!(ops.contains(&&PatchOp::SetProp {
            name: "role".into(),
            value: "row".into()
        }));
        assert!(ops.contains(&&PatchOp::RemoveProp {
            name: "title".into()
        }));
    }

    #[test]
    fn kind_mismatch_replaces() {
        let instance = InstanceId::next();
        let old = row(vec![text("x")]);
        let new = text("x");

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert!(matches!(patches.patches[0].op, PatchOp::Replace { .. }));
        assert!(patches.patches[0].path.is_empty());
    }

    #[test]
    fn same_child_reference_is_silent() {
        let instance = InstanceId::next();
        let child = InstanceId::next();
        let old = HostNode::Child { instance: child };
        let patches = reconcile(instance, &old, &old.clone());
        assert!(patches.is_empty());
    }

    #[test]
    fn keyed_reorder_emits_moves_not_replaces() {
        let instance = InstanceId::next();
        let old = list(vec![("a", text("a")), ("b", text("b")), ("c", text("c"))]);
        let new = list(vec![("c", text("c")), ("a", text("a")), ("b", text("b"))]);

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches.patches[0].op, PatchOp::MoveChild { from: 2, to: 0 });
    }

    #[test]
    fn keyed_removal_targets_exactly_the_vanished_key() {
        let instance = InstanceId::next();
        let old = list(vec![("a", text("a")), ("b", text("b")), ("c", text("c"))]);
        let new = list(vec![("a", text("a")), ("c", text("c"))]);

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches.patches[0].op, PatchOp::RemoveChild { index: 1 });
    }

    #[test]
    fn keyed_insert_lands_at_its_new_position() {
        let instance = InstanceId::next();
        let old = list(vec![("a", text("a")), ("c", text("c"))]);
        let new = list(vec![("a", text("a")), ("b", text("b")), ("c", text("c"))]);

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches.patches[0].op,
            PatchOp::InsertChild {
                index: 1,
                key: Some(Key::from("b")),
                node: text("b"),
            }
        );
    }

    #[test]
    fn keyed_match_recurses_into_content() {
        let instance = InstanceId::next();
        let old = list(vec![("a", text("before"))]);
        let new = list(vec![("a", text("after"))]);

        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches.patches[0].path, vec![0]);
        assert_eq!(
            patches.patches[0].op,
            PatchOp::SetText {
                value: "after".into()
            }
        );
    }

    #[test]
    fn plain_children_grow_and_shrink_positionally() {
        let instance = InstanceId::next();
        let old = row(vec![text("a")]);
        let new = row(vec![text("a"), text("b")]);
        let patches = reconcile(instance, &old, &new);
        assert_eq!(patches.len(), 1);
        assert!(matches!(
            patches.patches[0].op,
            PatchOp::InsertChild { index: 1, .. }
        ));

        let patches = reconcile(instance, &new, &old);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches.patches[0].op, PatchOp::RemoveChild { index: 1 });
    }
}
