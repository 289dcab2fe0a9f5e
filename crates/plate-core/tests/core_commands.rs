use manos_plate_core::{Editor, ElementKind, Node, PlateValue, ValueError};
use serde_json::json;

fn paragraph_text(editor: &Editor, ix: usize) -> String {
    match &editor.doc().children[ix] {
        Node::Element(el) => el
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}

#[test]
fn insert_text_moves_caret_past_inserted_text() {
    let mut editor = Editor::with_core_plugins();

    editor
        .run_command("text.insert", Some(json!({ "text": "héllo" })))
        .unwrap();
    editor
        .run_command("text.insert", Some(json!({ "text": "!" })))
        .unwrap();

    assert_eq!(paragraph_text(&editor, 0), "héllo!");
    assert_eq!(editor.selection().focus.offset, "héllo!".len());
}

#[test]
fn insert_text_requires_text_argument() {
    let mut editor = Editor::with_core_plugins();
    let err = editor.run_command("text.insert", None).unwrap_err();
    assert!(err.message().contains("args.text"));
    assert_eq!(editor.revision(), 0);
}

#[test]
fn deleting_only_block_leaves_empty_paragraph() {
    let mut editor = Editor::with_core_plugins();
    editor
        .run_command("text.insert", Some(json!({ "text": "bye" })))
        .unwrap();

    editor.run_command("block.delete", None).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert!(editor.undo());
    assert_eq!(paragraph_text(&editor, 0), "bye");
}

#[test]
fn blocks_insert_places_nodes_after_active_block() {
    let mut editor = Editor::with_richtext_plugins();
    let nodes = serde_json::to_value(vec![Node::paragraph("one"), Node::paragraph("two")]).unwrap();

    editor
        .run_command("blocks.insert", Some(json!({ "nodes": nodes })))
        .unwrap();

    assert_eq!(editor.doc().children.len(), 3);
    assert_eq!(paragraph_text(&editor, 1), "one");
    assert_eq!(paragraph_text(&editor, 2), "two");
    assert_eq!(editor.selection().focus.path, vec![2, 0]);
}

#[test]
fn blocks_insert_rejects_kinds_the_registry_does_not_know() {
    let mut editor = Editor::with_core_plugins();
    let before = editor.doc().clone();
    let nodes = serde_json::to_value(vec![Node::element(
        ElementKind::Blockquote,
        vec![Node::paragraph("quoted")],
    )])
    .unwrap();

    let err = editor
        .run_command("blocks.insert", Some(json!({ "nodes": nodes })))
        .unwrap_err();

    assert!(err.message().starts_with("Failed to insert blocks"));
    assert_eq!(editor.doc(), &before);
    assert!(!editor.can_undo());
}

#[test]
fn blocks_insert_rejects_malformed_nodes() {
    let mut editor = Editor::with_core_plugins();
    let err = editor
        .run_command(
            "blocks.insert",
            Some(json!({ "nodes": [{ "node": "element", "kind": "sidebar" }] })),
        )
        .unwrap_err();
    assert!(err.message().contains("Invalid args.nodes"));
}

#[test]
fn plate_value_wraps_document_with_schema_header() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();

    let value = PlateValue::from_document(editor.doc().clone());
    let json: serde_json::Value = serde_json::from_str(&value.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["schema"], "manos-document");
    assert_eq!(json["version"], 1);
    assert_eq!(json["document"]["children"][1]["kind"], "two_col_container");
    assert_eq!(
        json["document"]["children"][1]["children"][0]["kind"],
        "two_col_left"
    );

    let parsed = PlateValue::from_json_str(r#"{ "document": { "children": [] } }"#).unwrap();
    assert_eq!(parsed.schema, "manos-document");
    assert!(parsed.into_document().children.is_empty());
}

#[test]
fn plate_value_rejects_foreign_or_future_headers() {
    let foreign = PlateValue::from_json_str(r#"{ "schema": "other-editor", "document": { "children": [] } }"#);
    assert!(matches!(foreign, Err(ValueError::UnknownSchema(schema)) if schema == "other-editor"));

    let future = PlateValue::from_json_str(r#"{ "version": 9, "document": { "children": [] } }"#);
    assert!(matches!(
        future,
        Err(ValueError::UnsupportedVersion { found: 9, supported: 1 })
    ));

    assert!(matches!(PlateValue::from_json_str("[]"), Err(ValueError::Json(_))));
}
