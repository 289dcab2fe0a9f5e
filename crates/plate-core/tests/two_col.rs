use manos_plate_core::{
    ApplyError, Document, Editor, ElementKind, ElementNode, Node, Op, PluginRegistry, Point,
    SchemaError, Selection, Transaction,
};

fn kinds(children: &[Node]) -> Vec<ElementKind> {
    children
        .iter()
        .filter_map(|n| match n {
            Node::Element(el) => Some(el.kind),
            _ => None,
        })
        .collect()
}

fn text_of(node: &Node) -> String {
    let Node::Element(el) = node else {
        return String::new();
    };
    el.children
        .iter()
        .filter_map(|n| match n {
            Node::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect()
}

fn assert_layouts_well_formed(children: &[Node]) {
    for node in children {
        let Node::Element(el) = node else {
            continue;
        };
        if el.kind == ElementKind::TwoColContainer {
            assert_eq!(
                kinds(&el.children),
                vec![ElementKind::TwoColLeft, ElementKind::TwoColRight]
            );
            for column in &el.children {
                let Node::Element(column) = column else {
                    panic!("expected column element");
                };
                assert!(!column.children.is_empty());
            }
        }
        assert_layouts_well_formed(&el.children);
    }
}

fn layout_doc(left: Vec<Node>, right: Vec<Node>) -> Document {
    Document {
        children: vec![Node::element(
            ElementKind::TwoColContainer,
            vec![
                Node::element(ElementKind::TwoColLeft, left),
                Node::element(ElementKind::TwoColRight, right),
            ],
        )],
    }
}

#[test]
fn insert_creates_complete_layout_and_moves_caret_into_left_column() {
    let mut editor = Editor::with_richtext_plugins();

    editor.run_command("two_col.insert", None).unwrap();

    assert_eq!(
        kinds(&editor.doc().children),
        vec![
            ElementKind::Paragraph,
            ElementKind::TwoColContainer,
            ElementKind::Paragraph
        ]
    );
    let Node::Element(container) = &editor.doc().children[1] else {
        panic!("expected layout container");
    };
    assert_eq!(
        kinds(&container.children),
        vec![ElementKind::TwoColLeft, ElementKind::TwoColRight]
    );
    for column in &container.children {
        let Node::Element(column) = column else {
            panic!("expected column element");
        };
        assert_eq!(kinds(&column.children), vec![ElementKind::Paragraph]);
    }

    assert_eq!(editor.selection().focus.path, vec![1, 0, 0, 0]);
    assert!(editor.run_query::<bool>("two_col.is_active", None).unwrap());
}

#[test]
fn deleting_last_block_in_column_leaves_placeholder_paragraph() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();
    editor
        .run_command("text.insert", Some(serde_json::json!({ "text": "gone" })))
        .unwrap();

    editor.run_command("block.delete", None).unwrap();

    let Node::Element(container) = &editor.doc().children[1] else {
        panic!("expected layout container");
    };
    let Node::Element(left) = &container.children[0] else {
        panic!("expected left column");
    };
    assert_eq!(left.children.len(), 1);
    assert_eq!(text_of(&left.children[0]), "");
    assert_layouts_well_formed(&editor.doc().children);
}

#[test]
fn removing_a_column_directly_is_rejected() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();
    let before = editor.doc().clone();
    let revision = editor.revision();

    let err = editor
        .apply(Transaction::new(vec![Op::RemoveNode {
            path: vec![1, 1],
        }]))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplyError::SchemaViolation(SchemaError::ArityMismatch { .. })
    ));
    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.revision(), revision);
}

#[test]
fn swapping_columns_is_rejected() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();

    let err = editor
        .apply(Transaction::new(vec![
            Op::RemoveNode { path: vec![1, 0] },
            Op::InsertNode {
                path: vec![1, 1],
                node: Node::element(ElementKind::TwoColLeft, vec![Node::paragraph("")]),
            },
        ]))
        .unwrap_err();
    assert!(matches!(err, ApplyError::SchemaViolation(_)));
}

#[test]
fn column_outside_container_is_rejected() {
    let mut editor = Editor::with_richtext_plugins();
    let err = editor
        .apply(Transaction::new(vec![Op::InsertNode {
            path: vec![1],
            node: Node::element(ElementKind::TwoColRight, vec![Node::paragraph("")]),
        }]))
        .unwrap_err();
    assert!(matches!(
        err,
        ApplyError::SchemaViolation(SchemaError::DisallowedChild { .. })
    ));
    assert_eq!(editor.doc().children.len(), 1);
}

#[test]
fn inline_content_directly_in_column_is_rejected() {
    let doc = layout_doc(vec![Node::text("loose", Default::default())], vec![]);
    let selection = Selection::collapsed(Point::new(vec![0], 0));
    assert!(Editor::new(doc, selection, PluginRegistry::richtext()).is_err());
}

#[test]
fn empty_columns_are_filled_on_load() {
    let doc = layout_doc(vec![], vec![Node::paragraph("right")]);
    let selection = Selection::collapsed(Point::new(vec![0, 1, 0, 0], 0));
    let editor = Editor::new(doc, selection, PluginRegistry::richtext()).unwrap();
    assert_layouts_well_formed(&editor.doc().children);
}

#[test]
fn delete_removes_container_as_a_unit() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();

    editor.run_command("two_col.delete", None).unwrap();

    assert_eq!(
        kinds(&editor.doc().children),
        vec![ElementKind::Paragraph, ElementKind::Paragraph]
    );
    assert!(!editor.run_query::<bool>("two_col.is_active", None).unwrap());

    assert!(editor.undo());
    assert_layouts_well_formed(&editor.doc().children);
    assert_eq!(editor.doc().children.len(), 3);
}

#[test]
fn delete_of_only_block_keeps_document_non_empty() {
    let doc = layout_doc(vec![Node::paragraph("a")], vec![Node::paragraph("b")]);
    let selection = Selection::collapsed(Point::new(vec![0, 0, 0, 0], 0));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext()).unwrap();

    editor.run_command("two_col.delete", None).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
}

#[test]
fn unwrap_flattens_columns_and_remaps_selection() {
    let doc = layout_doc(
        vec![Node::paragraph("a")],
        vec![Node::paragraph("b"), Node::paragraph("c")],
    );
    let selection = Selection::collapsed(Point::new(vec![0, 1, 1, 0], 1));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext()).unwrap();

    editor.run_command("two_col.unwrap", None).unwrap();

    let texts: Vec<String> = editor.doc().children.iter().map(text_of).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
    assert_eq!(editor.selection().focus.path, vec![2, 0]);
    assert_eq!(editor.selection().focus.offset, 1);
}

#[test]
fn layouts_nest_inside_columns() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();
    editor.run_command("two_col.insert", None).unwrap();

    assert_eq!(editor.selection().focus.path, vec![1, 0, 1, 0, 0, 0]);
    assert_layouts_well_formed(&editor.doc().children);
}

#[test]
fn structural_edit_sequences_keep_layouts_well_formed() {
    let mut editor = Editor::with_richtext_plugins();
    let commands = [
        "two_col.insert",
        "block.delete",
        "block.delete",
        "blockquote.wrap_selection",
        "list.toggle_bulleted",
        "block.delete",
        "two_col.insert",
        "blockquote.unwrap",
        "block.delete",
    ];

    for id in commands {
        let _ = editor.run_command(id, None);
        assert_layouts_well_formed(&editor.doc().children);
    }
    while editor.undo() {
        assert_layouts_well_formed(&editor.doc().children);
    }
}

#[test]
fn column_direction_is_independent_of_nested_blocks() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();

    editor
        .run_command(
            "block.set_dir",
            Some(serde_json::json!({ "dir": "rtl", "scope": "column" })),
        )
        .unwrap();
    editor
        .run_command("block.set_dir", Some(serde_json::json!({ "dir": "ltr" })))
        .unwrap();

    let Some(Node::Element(left)) = editor.doc().node(&[1, 0]) else {
        panic!("expected left column");
    };
    assert_eq!(left.attr_str("dir"), Some("rtl"));
    let Some(Node::Element(paragraph)) = editor.doc().node(&[1, 0, 0]) else {
        panic!("expected paragraph");
    };
    assert_eq!(paragraph.attr_str("dir"), Some("ltr"));

    let container: &ElementNode = match editor.doc().node(&[1]) {
        Some(Node::Element(el)) => el,
        _ => panic!("expected container"),
    };
    assert!(container.attrs.is_empty());
}
