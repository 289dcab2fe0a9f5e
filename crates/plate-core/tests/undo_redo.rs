use manos_plate_core::{
    ApplyError, Document, Editor, Node, Op, PluginRegistry, Point, Selection, Transaction,
};

fn single_paragraph(text: &str) -> Editor {
    let children = vec![Node::paragraph(text)];
    let caret = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(Document { children }, caret, PluginRegistry::core()).unwrap()
}

fn insert(path: &[usize], offset: usize, text: &str) -> Op {
    Op::InsertText {
        path: path.to_vec(),
        offset,
        text: text.to_string(),
    }
}

#[test]
fn sequential_inserts_undo_as_one_step() {
    let mut editor = single_paragraph("");
    let typed = Transaction::new(vec![insert(&[0, 0], 0, "o"), insert(&[0, 0], 1, "k")])
        .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)));

    editor.apply(typed).unwrap();
    assert_eq!(editor.doc().children, [Node::paragraph("ok")]);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, [Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);
    assert!(!editor.can_undo());

    assert!(editor.redo());
    assert_eq!(editor.doc().children, [Node::paragraph("ok")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn mixed_text_and_node_ops_restore_doc_and_selection() {
    let mut editor = single_paragraph("tail");
    let before = (editor.doc().clone(), editor.selection().clone());

    let split = Transaction::new(vec![
        Op::RemoveText {
            path: vec![0, 0],
            range: 0..4,
        },
        insert(&[0, 0], 0, "head"),
        Op::InsertNode {
            path: vec![1],
            node: Node::paragraph("tail"),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![1, 0], 0)))
    .source("split");
    editor.apply(split).unwrap();
    let after = (editor.doc().clone(), editor.selection().clone());
    assert_eq!(
        after.0.children,
        [Node::paragraph("head"), Node::paragraph("tail")]
    );

    assert!(editor.undo());
    assert_eq!((editor.doc().clone(), editor.selection().clone()), before);

    assert!(editor.redo());
    assert_eq!((editor.doc().clone(), editor.selection().clone()), after);
}

#[test]
fn only_committed_changes_bump_the_revision() {
    let mut editor = single_paragraph("abc");
    assert_eq!(editor.revision(), 0);

    editor
        .apply(Transaction::new(vec![insert(&[0, 0], 3, "d")]))
        .unwrap();
    assert_eq!(editor.revision(), 1);

    let err = editor
        .apply(Transaction::new(vec![Op::RemoveNode { path: vec![7] }]))
        .unwrap_err();
    assert!(matches!(err, ApplyError::InvalidPath(_)));
    assert_eq!(editor.revision(), 1);
    assert_eq!(editor.doc().children, [Node::paragraph("abcd")]);

    assert!(editor.undo());
    assert!(editor.redo());
    assert!(!editor.redo());
    assert_eq!(editor.revision(), 3);
}

#[test]
fn a_bad_op_discards_the_ops_before_it() {
    let mut editor = single_paragraph("keep");

    let result = editor.apply(Transaction::new(vec![
        insert(&[0, 0], 0, "lost "),
        insert(&[3, 0], 0, "nowhere"),
    ]));

    assert!(result.is_err());
    assert_eq!(editor.doc().children, [Node::paragraph("keep")]);
    assert!(!editor.can_undo());
}

#[test]
fn offsets_inside_a_character_snap_to_its_start() {
    let mut editor = single_paragraph("añb");

    editor
        .apply(Transaction::new(vec![insert(&[0, 0], 2, "|")]))
        .unwrap();

    assert_eq!(editor.doc().children, [Node::paragraph("a|ñb")]);
}

#[test]
fn commands_that_change_nothing_leave_no_undo_entry() {
    let mut editor = Editor::with_richtext_plugins();

    editor.run_command("block.unset_heading", None).unwrap();
    editor.apply(Transaction::new(Vec::new())).unwrap();

    assert_eq!(editor.revision(), 0);
    assert!(!editor.can_undo());
}
