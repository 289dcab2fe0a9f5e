use manos_plate_core::{Document, Editor, Marks, Node, PluginRegistry, Point, Selection};
use serde_json::json;

fn flag(editor: &Editor, query: &str) -> bool {
    editor.run_query(query, None).unwrap()
}

/// Text and bold flag of each leaf in the block at `ix`.
fn runs(editor: &Editor, ix: usize) -> Vec<(String, bool)> {
    let Node::Element(block) = &editor.doc().children[ix] else {
        panic!("expected a text block at {ix}");
    };
    block
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Text(leaf) => Some((leaf.text.clone(), leaf.marks.bold)),
            _ => None,
        })
        .collect()
}

#[test]
fn bold_splits_only_the_selected_range() {
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![0, 0], 3),
    };
    let children = vec![Node::paragraph("abcde")];
    let mut editor =
        Editor::new(Document { children }, selection, PluginRegistry::richtext()).unwrap();

    editor.run_command("marks.toggle_bold", None).unwrap();
    assert_eq!(
        runs(&editor, 0),
        vec![
            ("a".to_string(), false),
            ("bc".to_string(), true),
            ("de".to_string(), false),
        ]
    );
    assert!(!editor.selection().is_collapsed());

    editor.run_command("marks.toggle_bold", None).unwrap();
    assert_eq!(runs(&editor, 0), vec![("abcde".to_string(), false)]);
}

#[test]
fn mark_queries_follow_the_caret() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("text.insert", Some(json!({ "text": "hello" })))
        .unwrap();
    assert!(!flag(&editor, "marks.is_bold_active"));

    editor.run_command("marks.toggle_bold", None).unwrap();
    editor.run_command("marks.toggle_italic", None).unwrap();
    assert!(flag(&editor, "marks.is_bold_active"));
    assert!(flag(&editor, "marks.is_italic_active"));

    let active: Marks = editor.run_query("marks.get_active", None).unwrap();
    assert!(active.bold && active.italic && !active.code);
}

#[test]
fn links_are_set_and_removed() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("text.insert", Some(json!({ "text": "site" })))
        .unwrap();

    editor
        .run_command("marks.set_link", Some(json!({ "url": "https://example.org" })))
        .unwrap();
    assert!(flag(&editor, "marks.has_link_active"));

    editor.run_command("marks.unset_link", None).unwrap();
    let active: Marks = editor.run_query("marks.get_active", None).unwrap();
    assert_eq!(active.link, None);
}

#[test]
fn link_range_can_cross_both_columns() {
    let mut editor = Editor::with_richtext_plugins();
    editor.run_command("two_col.insert", None).unwrap();
    for (path, text) in [(vec![1, 0, 0, 0], "west"), (vec![1, 1, 0, 0], "east")] {
        editor.set_selection(Selection::collapsed(Point::new(path, 0)));
        editor
            .run_command("text.insert", Some(json!({ "text": text })))
            .unwrap();
    }

    editor.set_selection(Selection {
        anchor: Point::new(vec![1, 0, 0, 0], 0),
        focus: Point::new(vec![1, 1, 0, 0], 4),
    });
    editor
        .run_command("marks.set_link", Some(json!({ "url": "https://example.org" })))
        .unwrap();

    for path in [[1, 0, 0, 0], [1, 1, 0, 0]] {
        let Some(Node::Text(leaf)) = editor.doc().node(&path) else {
            panic!("expected text at {path:?}");
        };
        assert_eq!(leaf.marks.link.as_deref(), Some("https://example.org"), "{path:?}");
    }
}

#[test]
fn unknown_command_and_query_ids_are_named_in_the_error() {
    let mut editor = Editor::with_richtext_plugins();

    let err = editor.run_command("columns.insert", None).unwrap_err();
    assert!(err.message().contains("columns.insert"));

    let err = editor.run_query_json("marks.nope", None).unwrap_err();
    assert!(err.message().contains("marks.nope"));
}
