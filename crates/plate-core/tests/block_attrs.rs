use manos_plate_core::{
    Attrs, Document, Editor, ElementKind, ElementNode, Node, PluginRegistry, Point, Selection,
};
use serde_json::{Value, json};

fn load(children: Vec<Node>, selection: Selection) -> Editor {
    Editor::new(Document { children }, selection, PluginRegistry::richtext()).unwrap()
}

fn block_with_attr(kind: ElementKind, key: &str, value: Value) -> Node {
    let mut attrs = Attrs::default();
    attrs.insert(key.to_string(), value);
    Node::Element(ElementNode {
        kind,
        attrs,
        children: vec![Node::text("x", Default::default())],
    })
}

fn block(editor: &Editor, ix: usize) -> &ElementNode {
    match &editor.doc().children[ix] {
        Node::Element(el) => el,
        other => panic!("expected a block at {ix}, got {other:?}"),
    }
}

fn attr_query(editor: &Editor, id: &str, args: Option<Value>) -> Option<String> {
    editor.run_query(id, args).unwrap()
}

#[test]
fn alignment_is_set_and_left_clears_it() {
    let mut editor = Editor::with_richtext_plugins();
    assert_eq!(attr_query(&editor, "block.align", None), None);

    editor
        .run_command("block.set_align", Some(json!({ "align": "center" })))
        .unwrap();
    assert_eq!(block(&editor, 0).attr_str("align"), Some("center"));
    assert_eq!(attr_query(&editor, "block.align", None).as_deref(), Some("center"));

    editor
        .run_command("block.set_align", Some(json!({ "align": "left" })))
        .unwrap();
    assert!(!block(&editor, 0).attrs.contains_key("align"));
    assert_eq!(attr_query(&editor, "block.align", None), None);
}

#[test]
fn alignment_covers_every_selected_block() {
    let mut editor = load(
        vec![Node::paragraph("one"), Node::paragraph("two"), Node::paragraph("three")],
        Selection {
            anchor: Point::new(vec![2, 0], 2),
            focus: Point::new(vec![0, 0], 0),
        },
    );

    editor
        .run_command("block.set_align", Some(json!({ "align": "justify" })))
        .unwrap();

    for ix in 0..3 {
        assert_eq!(block(&editor, ix).attr_str("align"), Some("justify"), "block {ix}");
    }
}

#[test]
fn unknown_alignment_is_rejected() {
    let mut editor = Editor::with_richtext_plugins();
    let err = editor
        .run_command("block.set_align", Some(json!({ "align": "middle" })))
        .unwrap_err();

    assert!(err.message().contains("middle"));
    assert_eq!(editor.revision(), 0);
}

#[test]
fn loading_drops_default_and_malformed_alignment() {
    for value in [json!("left"), json!(true), json!("diagonal")] {
        let editor = load(
            vec![block_with_attr(ElementKind::Paragraph, "align", value.clone())],
            Selection::collapsed(Point::new(vec![0, 0], 0)),
        );
        assert!(!block(&editor, 0).attrs.contains_key("align"), "{value}");
    }
}

#[test]
fn column_scope_targets_the_column_element() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();

    editor
        .run_command(
            "block.set_align",
            Some(json!({ "align": "right", "scope": "column" })),
        )
        .unwrap();

    let column_scope = Some(json!({ "scope": "column" }));
    assert_eq!(
        attr_query(&editor, "block.align", column_scope).as_deref(),
        Some("right")
    );
    assert_eq!(attr_query(&editor, "block.align", None), None);

    let layout = block(&editor, 1);
    assert!(!layout.attrs.contains_key("align"));
    let columns: Vec<_> = layout
        .children
        .iter()
        .map(|column| match column {
            Node::Element(el) => (el.kind, el.attr_str("align")),
            other => panic!("expected a column, got {other:?}"),
        })
        .collect();
    assert_eq!(
        columns,
        vec![
            (ElementKind::TwoColLeft, Some("right")),
            (ElementKind::TwoColRight, None),
        ]
    );
}

#[test]
fn column_scope_needs_a_layout() {
    let mut editor = Editor::with_richtext_plugins();
    let before = editor.doc().clone();

    let result = editor.run_command(
        "block.set_align",
        Some(json!({ "align": "center", "scope": "column" })),
    );

    assert!(result.is_err());
    assert_eq!(editor.doc(), &before);
}

#[test]
fn direction_is_set_queried_and_unset() {
    let mut editor = Editor::with_richtext_plugins();

    editor
        .run_command("block.set_dir", Some(json!({ "dir": "rtl" })))
        .unwrap();
    assert_eq!(block(&editor, 0).attr_str("dir"), Some("rtl"));
    assert_eq!(attr_query(&editor, "block.dir", None).as_deref(), Some("rtl"));

    editor.run_command("block.unset_dir", None).unwrap();
    assert_eq!(attr_query(&editor, "block.dir", None), None);

    assert!(
        editor
            .run_command("block.set_dir", Some(json!({ "dir": "sideways" })))
            .is_err()
    );
}

#[test]
fn direction_can_apply_to_a_whole_column() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();
    editor.set_selection(Selection::collapsed(Point::new(vec![1, 1, 0, 0], 0)));

    editor
        .run_command("block.set_dir", Some(json!({ "dir": "rtl", "scope": "column" })))
        .unwrap();

    let Some(Node::Element(right)) = editor.doc().node(&[1, 1]) else {
        panic!("expected the right column");
    };
    assert_eq!(right.attr_str("dir"), Some("rtl"));
    assert_eq!(attr_query(&editor, "block.dir", None), None);
}

#[test]
fn heading_level_is_set_and_cleared() {
    let mut editor = Editor::with_richtext_plugins();
    let level = |editor: &Editor| -> Option<u64> {
        editor.run_query("block.heading_level", None).unwrap()
    };
    assert_eq!(level(&editor), None);

    editor
        .run_command("block.set_heading", Some(json!({ "level": 3 })))
        .unwrap();
    assert_eq!(block(&editor, 0).kind, ElementKind::Heading);
    assert_eq!(level(&editor), Some(3));

    editor.run_command("block.unset_heading", None).unwrap();
    let paragraph = block(&editor, 0);
    assert_eq!(paragraph.kind, ElementKind::Paragraph);
    assert!(!paragraph.attrs.contains_key("level"));
    assert_eq!(level(&editor), None);
}

#[test]
fn heading_conversion_keeps_layout_attrs() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("block.set_dir", Some(json!({ "dir": "rtl" })))
        .unwrap();
    editor
        .run_command("block.set_align", Some(json!({ "align": "center" })))
        .unwrap();

    editor
        .run_command("block.set_heading", Some(json!({ "level": 1 })))
        .unwrap();

    let heading = block(&editor, 0);
    assert_eq!(heading.kind, ElementKind::Heading);
    assert_eq!(
        (heading.attr_str("align"), heading.attr_str("dir")),
        (Some("center"), Some("rtl"))
    );
}

#[test]
fn out_of_range_heading_level_is_clamped_on_load() {
    let editor = load(
        vec![block_with_attr(ElementKind::Heading, "level", json!(42))],
        Selection::collapsed(Point::new(vec![0, 0], 0)),
    );

    let heading = block(&editor, 0);
    assert_eq!(heading.kind, ElementKind::Heading);
    assert_eq!(heading.attrs.get("level").and_then(Value::as_u64), Some(6));
}
