use dom::{Document, DomPatch, DomPatchError, ElementSpec, MutationRecord, NodeKey, ObserveOptions};

fn listing(doc: &mut Document) -> NodeKey {
    let body = doc.body().expect("body");
    let (key, patches) = doc.patches_for(body, &ElementSpec::new("div").class("sitetable"));
    doc.apply(&patches).expect("apply");
    key
}

#[test]
fn subtree_insert_yields_single_child_list_record() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    let observer = doc.observe(root, ObserveOptions::child_list_subtree());

    let spec = ElementSpec::new("div")
        .class("comment")
        .child(ElementSpec::new("p").text("body"));
    let (key, patches) = doc.patches_for(root, &spec);
    doc.apply(&patches).unwrap();

    let batches = doc.take_records();
    assert_eq!(batches.len(), 1);
    let (id, records) = &batches[0];
    assert_eq!(*id, observer);
    assert_eq!(
        records,
        &vec![MutationRecord::ChildList {
            target: root,
            added: vec![key],
            removed: Vec::new(),
        }]
    );
    assert!(doc.take_records().is_empty());
}

#[test]
fn records_outside_observed_subtree_are_not_queued() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    doc.observe(root, ObserveOptions::child_list_subtree());

    let head = doc.head().unwrap();
    let (_, patches) = doc.patches_for(head, &ElementSpec::new("style"));
    doc.apply(&patches).unwrap();

    assert!(!doc.has_pending_records());
}

#[test]
fn nested_insertions_are_seen_with_subtree() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    let (inner, patches) = doc.patches_for(root, &ElementSpec::new("div").class("child"));
    doc.apply(&patches).unwrap();

    let observer = doc.observe(root, ObserveOptions::child_list_subtree());
    let (added, patches) = doc.patches_for(inner, &ElementSpec::new("div").class("comment"));
    doc.apply(&patches).unwrap();

    let batches = doc.take_records();
    assert_eq!(
        batches,
        vec![(
            observer,
            vec![MutationRecord::ChildList {
                target: inner,
                added: vec![added],
                removed: Vec::new(),
            }]
        )]
    );
}

#[test]
fn attribute_filter_limits_records() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    doc.observe(root, ObserveOptions::attributes_of(&["style"]));

    doc.add_class(root, "marked").unwrap();
    assert!(!doc.has_pending_records());

    doc.set_attribute(root, "style", "--background:#ffffff").unwrap();
    let batches = doc.take_records();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].1,
        vec![MutationRecord::Attributes {
            target: root,
            name: "style".to_string(),
        }]
    );
}

#[test]
fn disconnect_drops_queue() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    let observer = doc.observe(root, ObserveOptions::child_list_subtree());
    let (_, patches) = doc.patches_for(root, &ElementSpec::new("div"));
    doc.apply(&patches).unwrap();

    assert!(doc.disconnect(observer));
    assert!(!doc.disconnect(observer));
    assert!(doc.take_records().is_empty());
}

#[test]
fn class_helpers_are_idempotent() {
    let mut doc = Document::new();
    let root = listing(&mut doc);

    assert!(doc.add_class(root, "hl").unwrap());
    assert!(!doc.add_class(root, "hl").unwrap());
    assert_eq!(doc.class_list(root).collect::<Vec<_>>(), vec!["sitetable", "hl"]);

    assert!(doc.remove_class(root, "hl").unwrap());
    assert!(!doc.remove_class(root, "hl").unwrap());
    assert_eq!(doc.class_list(root).collect::<Vec<_>>(), vec!["sitetable"]);
}

#[test]
fn class_helpers_reject_bad_tokens() {
    let mut doc = Document::new();
    let root = listing(&mut doc);

    for token in ["", "new comment", "tab\there"] {
        assert_eq!(
            doc.add_class(root, token),
            Err(DomPatchError::InvalidClassToken(token.to_string()))
        );
        assert_eq!(
            doc.remove_class(root, token),
            Err(DomPatchError::InvalidClassToken(token.to_string()))
        );
    }
    assert_eq!(doc.class_list(root).collect::<Vec<_>>(), vec!["sitetable"]);
}

#[test]
fn removed_node_reports_missing_key() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    doc.remove_node(root).unwrap();

    assert_eq!(doc.add_class(root, "hl"), Err(DomPatchError::MissingKey(root)));
    assert_eq!(
        doc.apply(&[DomPatch::CreateText {
            key: root,
            text: String::new(),
        }]),
        Err(DomPatchError::DuplicateKey(root))
    );
}

#[test]
fn cycles_and_double_parents_are_rejected() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    let (child, patches) = doc.patches_for(root, &ElementSpec::new("div"));
    doc.apply(&patches).unwrap();

    assert_eq!(
        doc.apply(&[DomPatch::AppendChild {
            parent: child,
            child: root,
        }]),
        Err(DomPatchError::CycleDetected {
            parent: child,
            child: root,
        })
    );
    assert_eq!(
        doc.append_child(root, child),
        Err(DomPatchError::InvalidParent(child))
    );
    assert_eq!(
        doc.apply(&[DomPatch::RemoveNode {
            key: NodeKey::INVALID
        }]),
        Err(DomPatchError::InvalidKey(NodeKey::INVALID))
    );
}

#[test]
fn insert_before_keeps_sibling_order() {
    let mut doc = Document::new();
    let root = listing(&mut doc);
    let (last, patches) = doc.patches_for(root, &ElementSpec::new("div").id("last"));
    doc.apply(&patches).unwrap();
    let (first, patches) = doc.patches_before(root, last, &ElementSpec::new("div").id("first"));
    doc.apply(&patches).unwrap();

    assert_eq!(doc.children(root), &[first, last]);
}
