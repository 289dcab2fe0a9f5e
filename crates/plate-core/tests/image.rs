use manos_plate_core::{Document, Editor, Node, PluginRegistry, Point, Selection, VoidKind};
use serde_json::{Value, json};

fn image_src(editor: &Editor, key: &str) -> Option<String> {
    let path = editor.doc().find_image(key)?;
    match editor.doc().node(&path)? {
        Node::Void(v) => v.attr_str("src").map(str::to_string),
        _ => None,
    }
}

fn insert_image(editor: &mut Editor, args: Value) {
    editor.run_command("image.insert", Some(args)).unwrap();
}

#[test]
fn image_lands_after_the_caret_block_with_a_fresh_paragraph() {
    let children = vec![Node::paragraph("hello"), Node::paragraph("after")];
    let caret = Selection::collapsed(Point::new(vec![0, 0], 2));
    let mut editor = Editor::new(Document { children }, caret, PluginRegistry::richtext()).unwrap();

    insert_image(&mut editor, json!({ "src": "https://example.com/a.png", "alt": "A" }));

    let Some(Node::Void(image)) = editor.doc().node(&[1]) else {
        panic!("expected an image at [1], got {:?}", editor.doc().children);
    };
    assert_eq!(image.kind, VoidKind::Image);
    assert_eq!(image.attr_str("src"), Some("https://example.com/a.png"));
    assert_eq!(image.attr_str("alt"), Some("A"));
    assert_eq!(editor.doc().children[2], Node::paragraph(""));
    assert_eq!(editor.doc().children[3], Node::paragraph("after"));
    assert_eq!(editor.selection().focus, Point::new(vec![2, 0], 0));
}

#[test]
fn blank_src_is_refused_and_blank_alt_dropped() {
    let mut editor = Editor::with_richtext_plugins();
    let err = editor
        .run_command("image.insert", Some(json!({ "src": "  " })))
        .unwrap_err();
    assert!(err.message().contains("src"));
    assert_eq!(editor.revision(), 0);

    insert_image(&mut editor, json!({ "src": "a.png", "alt": "" }));
    let Some(Node::Void(image)) = editor.doc().node(&[1]) else {
        panic!("expected an image at [1]");
    };
    assert!(!image.attrs.contains_key("alt"));
}

#[test]
fn core_registry_rejects_images() {
    let mut editor = Editor::with_core_plugins();
    assert!(editor.run_command("image.insert", None).is_err());

    let doc = Document {
        children: vec![Node::image("https://example.com/a.png", None)],
    };
    let selection = Selection::collapsed(Point::new(vec![0], 0));
    assert!(Editor::new(doc, selection, PluginRegistry::core()).is_err());
}

#[test]
fn resolve_image_updates_src_after_caret_moved_away() {
    let mut editor = Editor::with_richtext_plugins();
    insert_image(&mut editor, json!({ "src": "data:image/png;base64,AAAA", "key": "k1" }));

    editor
        .run_command("text.insert", Some(json!({ "text": "typing on" })))
        .unwrap();
    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 0)));
    let selection = editor.selection().clone();

    assert!(editor.resolve_image("k1", "https://i.ibb.co/x/a.png"));
    assert_eq!(
        image_src(&editor, "k1").as_deref(),
        Some("https://i.ibb.co/x/a.png")
    );
    assert_eq!(editor.selection(), &selection);
}

#[test]
fn resolve_image_for_deleted_image_is_a_no_op() {
    let mut editor = Editor::with_richtext_plugins();
    insert_image(&mut editor, json!({ "src": "data:image/png;base64,AAAA", "key": "gone" }));
    assert!(editor.undo());
    let revision = editor.revision();
    let doc = editor.doc().clone();

    assert!(!editor.resolve_image("gone", "https://i.ibb.co/x/a.png"));
    assert_eq!(editor.doc(), &doc);
    assert_eq!(editor.revision(), revision);

    // Bringing the image back brings the hosted copy.
    assert!(editor.redo());
    assert_eq!(
        image_src(&editor, "gone").as_deref(),
        Some("https://i.ibb.co/x/a.png")
    );
}

#[test]
fn late_resolution_keeps_redo_and_adds_no_undo_step() {
    let mut editor = Editor::with_richtext_plugins();
    insert_image(&mut editor, json!({ "src": "data:image/png;base64,AAAA", "key": "k1" }));
    editor
        .run_command("text.insert", Some(json!({ "text": "caption" })))
        .unwrap();
    assert!(editor.undo());

    assert!(editor.resolve_image("k1", "https://i.ibb.co/x/a.png"));
    assert!(editor.can_redo());

    assert!(editor.redo());
    assert_eq!(editor.doc().children[2], Node::paragraph("caption"));

    assert!(editor.undo());
    assert_eq!(editor.doc().children[2], Node::paragraph(""));
    assert_eq!(
        image_src(&editor, "k1").as_deref(),
        Some("https://i.ibb.co/x/a.png")
    );
}

#[test]
fn out_of_order_resolutions_each_land_on_their_own_image() {
    let mut editor = Editor::with_richtext_plugins();
    for key in ["first", "second"] {
        let src = format!("data:image/png;base64,{key}");
        insert_image(&mut editor, json!({ "src": src, "key": key }));
    }

    assert!(editor.resolve_image("second", "https://i.ibb.co/2.png"));
    assert!(editor.resolve_image("first", "https://i.ibb.co/1.png"));

    assert_eq!(image_src(&editor, "first").as_deref(), Some("https://i.ibb.co/1.png"));
    assert_eq!(image_src(&editor, "second").as_deref(), Some("https://i.ibb.co/2.png"));
}
