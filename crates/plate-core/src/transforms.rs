//! Transaction builders behind the registered commands. Builders read the
//! editor and return a [`Transaction`]; applying it is left to the caller so
//! schema rejection stays in one place.

use std::ops::Range;

use serde_json::Value;

use crate::editor::Editor;
use crate::node::{Document, ElementKind, ElementNode, IMAGE_KEY, Marks, Node};
use crate::ops::{Op, Path, Transaction};
use crate::tree::{AttrPatch, Point, Selection, clamp_to_char_boundary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockScope {
    /// The text block(s) under the selection.
    Block,
    /// The column enclosing the caret.
    Column,
}

pub(crate) fn child_path(parent: &[usize], ix: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

/// Path of the block holding the leaf `point` sits in.
fn block_of(point: &Point) -> Option<&[usize]> {
    let (_, block) = point.path.split_last()?;
    (!block.is_empty()).then_some(block)
}

/// Parent path and index of the block holding `point`.
fn block_slot(point: &Point) -> Option<(&[usize], usize)> {
    let (&ix, parent) = block_of(point)?.split_last()?;
    Some((parent, ix))
}

fn focus_block(editor: &Editor) -> Result<(Path, ElementNode), String> {
    let path = block_of(&editor.selection().focus).ok_or("No active block")?;
    match editor.doc().node(path) {
        Some(Node::Element(el)) => Ok((path.to_vec(), el.clone())),
        _ => Err("Active block is not a text block".into()),
    }
}

/// Parent path and index right after the focused block, at the block's level.
/// Without a focused block that is the end of the document.
fn insertion_after_focus(editor: &Editor) -> (Path, usize) {
    match block_slot(&editor.selection().focus) {
        Some((parent, ix)) => (parent.to_vec(), ix + 1),
        None => (Vec::new(), editor.doc().children.len()),
    }
}

fn insert_run(parent: &[usize], at: usize, nodes: Vec<Node>) -> impl Iterator<Item = Op> + '_ {
    nodes
        .into_iter()
        .enumerate()
        .map(move |(i, node)| Op::InsertNode {
            path: child_path(parent, at + i),
            node,
        })
}

/// Removes the node at `path` and puts `blocks` where it was.
fn splice(path: &[usize], blocks: Vec<Node>) -> Vec<Op> {
    let Some((&ix, parent)) = path.split_last() else {
        return Vec::new();
    };
    let removal = Op::RemoveNode {
        path: path.to_vec(),
    };
    std::iter::once(removal)
        .chain(insert_run(parent, ix, blocks))
        .collect()
}

/// Moves both points with `place`. Points it returns `None` for stay put.
fn relocate(sel: &Selection, place: impl Fn(&[usize]) -> Option<Path>) -> Selection {
    let moved = |point: &Point| Point {
        path: place(&point.path).unwrap_or_else(|| point.path.clone()),
        offset: point.offset,
    };
    Selection {
        anchor: moved(&sel.anchor),
        focus: moved(&sel.focus),
    }
}

fn children_at<'a>(doc: &'a Document, parent: &[usize]) -> Option<&'a [Node]> {
    if parent.is_empty() {
        return Some(&doc.children);
    }
    match doc.node(parent)? {
        Node::Element(el) => Some(&el.children),
        Node::Void(_) | Node::Text(_) => None,
    }
}

fn nearest_ancestor(
    doc: &Document,
    point_path: &[usize],
    accept: impl Fn(ElementKind) -> bool,
) -> Option<Path> {
    (1..=point_path.len())
        .rev()
        .map(|len| &point_path[..len])
        .find(|candidate| matches!(doc.node(candidate), Some(Node::Element(el)) if accept(el.kind)))
        .map(<[usize]>::to_vec)
}

/// Deepest ancestor of `point_path` (inclusive) that is an element of `kind`.
pub fn nearest_element_path(doc: &Document, point_path: &[usize], kind: ElementKind) -> Option<Path> {
    nearest_ancestor(doc, point_path, |candidate| candidate == kind)
}

fn nothing(source: &str) -> Transaction {
    Transaction::new(Vec::new()).source(source)
}

pub fn insert_text(editor: &Editor, text: String) -> Result<Transaction, String> {
    let focus = &editor.selection().focus;
    let Some(Node::Text(leaf)) = editor.doc().node(&focus.path) else {
        return Err("Selection is not in a text node".into());
    };
    let offset = clamp_to_char_boundary(&leaf.text, focus.offset);
    let caret = Point::new(focus.path.clone(), offset + text.len());

    Ok(Transaction::new(vec![Op::InsertText {
        path: focus.path.clone(),
        offset,
        text,
    }])
    .selection_after(Selection::collapsed(caret))
    .source("command:text.insert"))
}

pub fn delete_focused_block(editor: &Editor) -> Result<Transaction, String> {
    let path = block_of(&editor.selection().focus)
        .ok_or("No active block")?
        .to_vec();
    Ok(Transaction::new(vec![Op::RemoveNode { path: path.clone() }])
        .selection_after(Selection::collapsed(Point::new(path, 0)))
        .source("command:block.delete"))
}

pub fn insert_blocks(editor: &Editor, nodes: Vec<Node>) -> Result<Transaction, String> {
    let (parent, at) = insertion_after_focus(editor);
    let caret = child_path(&parent, at + nodes.len().saturating_sub(1));
    let ops = insert_run(&parent, at, nodes).collect();

    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .source("command:blocks.insert"))
}

/// Inserts a block image after the focused block, followed by an empty
/// paragraph that takes the caret.
pub fn insert_image(
    editor: &Editor,
    src: String,
    alt: Option<String>,
    key: Option<String>,
) -> Result<Transaction, String> {
    let (parent, at) = insertion_after_focus(editor);

    let mut image = Node::image(src, alt);
    if let (Node::Void(void), Some(key)) = (&mut image, key) {
        void.attrs.insert(IMAGE_KEY.to_string(), Value::String(key));
    }

    let caret = child_path(&child_path(&parent, at + 1), 0);
    let ops = insert_run(&parent, at, vec![image, Node::paragraph("")]).collect();
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .source("command:image.insert"))
}

/// Inserts a complete layout after the focused block with a trailing
/// paragraph, caret in the left column.
pub fn insert_two_col(editor: &Editor) -> Result<Transaction, String> {
    let (parent, at) = insertion_after_focus(editor);

    let mut caret = child_path(&parent, at);
    caret.extend([0, 0, 0]);

    let ops = insert_run(&parent, at, vec![Node::two_col(), Node::paragraph("")]).collect();
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .source("command:two_col.insert"))
}

pub fn delete_nearest_two_col(editor: &Editor) -> Result<Transaction, String> {
    let focus = &editor.selection().focus;
    let Some(layout) = nearest_element_path(editor.doc(), &focus.path, ElementKind::TwoColContainer)
    else {
        return Ok(nothing("command:two_col.delete"));
    };

    Ok(Transaction::new(vec![Op::RemoveNode {
        path: layout.clone(),
    }])
    .selection_after(Selection::collapsed(Point::new(layout, 0)))
    .source("command:two_col.delete"))
}

/// Replaces the nearest layout with the blocks of its columns, left first.
pub fn unwrap_nearest_two_col(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    let Some(layout) = nearest_element_path(editor.doc(), &sel.focus.path, ElementKind::TwoColContainer)
    else {
        return Ok(nothing("command:two_col.unwrap"));
    };
    let Some(Node::Element(container)) = editor.doc().node(&layout).cloned() else {
        return Err("Layout node not found".into());
    };
    let Some((&layout_ix, parent)) = layout.split_last() else {
        return Err("Invalid layout path".into());
    };

    // Blocks contributed by each column, for remapping points.
    let mut widths = Vec::with_capacity(container.children.len());
    let mut blocks = Vec::new();
    for column in container.children {
        match column {
            Node::Element(col) => {
                widths.push(col.children.len());
                blocks.extend(col.children);
            }
            other => {
                widths.push(1);
                blocks.push(other);
            }
        }
    }

    let depth = layout.len();
    let selection_after = relocate(sel, |path| {
        if path.len() < depth + 2 || !path.starts_with(&layout) {
            return None;
        }
        let (column, block) = (path[depth], path[depth + 1]);
        let before: usize = widths.iter().take(column).sum();
        let width = widths.get(column).copied().unwrap_or(1).max(1);

        let mut moved = child_path(parent, layout_ix + before + block.min(width - 1));
        moved.extend_from_slice(&path[depth + 2..]);
        Some(moved)
    });

    Ok(Transaction::new(splice(&layout, blocks))
        .selection_after(selection_after)
        .source("command:two_col.unwrap"))
}

/// Sets `key` on the targeted blocks that may carry it, or removes it when
/// `value` is `None`. Blocks already in that state are skipped.
pub fn set_block_attr(
    editor: &Editor,
    key: &str,
    value: Option<String>,
    scope: BlockScope,
    carriers: &[ElementKind],
) -> Result<Transaction, String> {
    let targets = match scope {
        BlockScope::Column => {
            let column = nearest_ancestor(editor.doc(), &editor.selection().focus.path, ElementKind::is_column)
                .ok_or("Caret is not inside a column")?;
            match editor.doc().node(&column) {
                Some(Node::Element(el)) => vec![(column, el)],
                _ => Vec::new(),
            }
        }
        BlockScope::Block => selected_text_blocks(editor, editor.selection())?,
    };

    let ops = targets
        .into_iter()
        .filter(|(_, el)| carriers.contains(&el.kind) && el.attr_str(key) != value.as_deref())
        .map(|(path, _)| Op::SetNodeAttrs {
            path,
            patch: match &value {
                Some(value) => AttrPatch::set(key, value.as_str()),
                None => AttrPatch::remove(key),
            },
        })
        .collect();

    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(format!("command:block.set_{key}")))
}

pub fn active_block_attr(editor: &Editor, key: &str, scope: BlockScope) -> Value {
    let focus = &editor.selection().focus;
    let path = match scope {
        BlockScope::Block => block_of(focus).map(<[usize]>::to_vec),
        BlockScope::Column => nearest_ancestor(editor.doc(), &focus.path, ElementKind::is_column),
    };
    match path.as_deref().and_then(|path| editor.doc().node(path)) {
        Some(Node::Element(el)) => el.attr_str(key).map_or(Value::Null, Value::from),
        _ => Value::Null,
    }
}

pub fn active_list_type(editor: &Editor) -> Option<String> {
    let (_, el) = focus_block(editor).ok()?;
    if el.kind != ElementKind::ListItem {
        return None;
    }
    el.attr_str("list_type").map(str::to_string)
}

pub fn active_heading_level(editor: &Editor) -> Value {
    match focus_block(editor) {
        Ok((_, el)) if el.kind == ElementKind::Heading => {
            let level = el.attrs.get("level").and_then(Value::as_u64);
            Value::from(level.unwrap_or(1).clamp(1, 6))
        }
        _ => Value::Null,
    }
}

/// Swaps the focused block for `el`, keeping the caret where it is.
fn replace_focused(editor: &Editor, path: &[usize], el: ElementNode, source: String) -> Transaction {
    Transaction::new(splice(path, vec![Node::Element(el)]))
        .selection_after(editor.selection().clone())
        .source(source)
}

pub fn set_heading(editor: &Editor, level: u64) -> Result<Transaction, String> {
    let level = level.clamp(1, 6);
    let (path, mut el) = focus_block(editor)?;
    if !editor.registry().is_text_block(el.kind) {
        return Err("Active block is not a text block".into());
    }
    let source = "command:block.set_heading".to_string();
    if el.kind == ElementKind::Heading && el.attrs.get("level").and_then(Value::as_u64) == Some(level) {
        return Ok(nothing(&source));
    }

    el.kind = ElementKind::Heading;
    el.attrs.remove("list_type");
    el.attrs.insert("level".to_string(), Value::from(level));
    Ok(replace_focused(editor, &path, el, source))
}

pub fn unset_heading(editor: &Editor) -> Result<Transaction, String> {
    let (path, mut el) = focus_block(editor)?;
    let source = "command:block.unset_heading".to_string();
    if el.kind != ElementKind::Heading {
        return Ok(nothing(&source));
    }

    el.kind = ElementKind::Paragraph;
    el.attrs.remove("level");
    Ok(replace_focused(editor, &path, el, source))
}

/// Paragraphs and headings become list items of `list_type`; items of that
/// type turn back into paragraphs; items of the other type switch over.
pub fn toggle_list(editor: &Editor, list_type: &str) -> Result<Transaction, String> {
    let (path, mut el) = focus_block(editor)?;

    match el.kind {
        ElementKind::ListItem if el.attr_str("list_type") == Some(list_type) => {
            el.kind = ElementKind::Paragraph;
            el.attrs.remove("list_type");
        }
        ElementKind::Paragraph | ElementKind::Heading | ElementKind::ListItem => {
            el.kind = ElementKind::ListItem;
            el.attrs.remove("level");
            el.attrs.insert("list_type".to_string(), Value::from(list_type));
        }
        _ => return Err("Active block is not a text block".into()),
    }

    Ok(replace_focused(editor, &path, el, format!("command:list.toggle_{list_type}")))
}

pub fn unwrap_list_item(editor: &Editor) -> Result<Transaction, String> {
    let (path, mut el) = focus_block(editor)?;
    let source = "command:list.unwrap".to_string();
    if el.kind != ElementKind::ListItem {
        return Ok(nothing(&source));
    }

    el.kind = ElementKind::Paragraph;
    el.attrs.remove("list_type");
    Ok(replace_focused(editor, &path, el, source))
}

/// Moves the sibling blocks from the selection start through its end into a
/// new blockquote. Both ends must share a parent.
pub fn wrap_selection_in_blockquote(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    let (start, end) = sel.ordered();
    let (parent, first) = block_slot(start).ok_or("Selection start is not in a text block")?;
    let (end_parent, last) = block_slot(end).ok_or("Selection end is not in a text block")?;
    if parent != end_parent {
        return Err("Selection must be within a single block container".into());
    }
    let (first, last) = (first.min(last), first.max(last));

    let siblings = children_at(editor.doc(), parent).ok_or("Selection parent is not a container")?;
    let quoted = siblings
        .get(first..=last)
        .ok_or("Selection block range is out of bounds")?
        .to_vec();

    let mut ops: Vec<Op> = (first..=last)
        .rev()
        .map(|ix| Op::RemoveNode {
            path: child_path(parent, ix),
        })
        .collect();
    ops.push(Op::InsertNode {
        path: child_path(parent, first),
        node: Node::element(ElementKind::Blockquote, quoted),
    });

    let depth = parent.len();
    let selection_after = relocate(sel, |path| {
        if path.len() < depth + 2 || !path.starts_with(parent) {
            return None;
        }
        let block = path[depth];
        if !(first..=last).contains(&block) {
            return None;
        }
        let mut moved = child_path(parent, first);
        moved.push(block - first);
        moved.extend_from_slice(&path[depth + 1..]);
        Some(moved)
    });

    Ok(Transaction::new(ops)
        .selection_after(selection_after)
        .source("command:blockquote.wrap_selection"))
}

/// Lifts the blocks of the nearest blockquote into its parent.
pub fn unwrap_nearest_blockquote(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    let Some(quote) = nearest_element_path(editor.doc(), &sel.focus.path, ElementKind::Blockquote)
    else {
        return Ok(nothing("command:blockquote.unwrap"));
    };
    let Some(Node::Element(quote_el)) = editor.doc().node(&quote).cloned() else {
        return Err("Blockquote node not found".into());
    };
    let Some((&quote_ix, parent)) = quote.split_last() else {
        return Err("Invalid blockquote path".into());
    };

    let depth = quote.len();
    let selection_after = relocate(sel, |path| {
        if path.len() <= depth || !path.starts_with(&quote) {
            return None;
        }
        let mut moved = child_path(parent, quote_ix + path[depth]);
        moved.extend_from_slice(&path[depth + 1..]);
        Some(moved)
    });

    Ok(Transaction::new(splice(&quote, quote_el.children))
        .selection_after(selection_after)
        .source("command:blockquote.unwrap"))
}

/// Text blocks from the selection start through its end, in document order.
fn selected_text_blocks<'a>(
    editor: &'a Editor,
    sel: &Selection,
) -> Result<Vec<(Path, &'a ElementNode)>, String> {
    let (start, end) = sel.ordered();
    let mut blocks: Vec<_> = editor
        .doc()
        .elements()
        .into_iter()
        .filter(|(_, el)| editor.registry().is_text_block(el.kind))
        .collect();

    let position = |point: &Point, which: &str| {
        let block = block_of(point);
        blocks
            .iter()
            .position(|(path, _)| Some(path.as_slice()) == block)
            .ok_or_else(|| format!("Selection {which} is not in a text block"))
    };
    let first = position(start, "start")?;
    let last = position(end, "end")?;

    blocks.truncate(first.max(last) + 1);
    blocks.drain(..first.min(last));
    Ok(blocks)
}

/// A selected text block and the inline range of it the selection covers.
struct Covered<'a> {
    path: Path,
    children: &'a [Node],
    range: Range<usize>,
}

/// Selected blocks with a non-empty covered range.
fn covered_blocks<'a>(editor: &'a Editor, sel: &Selection) -> Result<Vec<Covered<'a>>, String> {
    let (start, end) = sel.ordered();
    let covered = selected_text_blocks(editor, sel)?
        .into_iter()
        .filter_map(|(path, el)| {
            let children = el.children.as_slice();
            let from = if is_in_block(start, &path) {
                inline_offset(children, start)
            } else {
                0
            };
            let to = if is_in_block(end, &path) {
                inline_offset(children, end)
            } else {
                children.iter().map(Node::inline_len).sum()
            };
            (from < to).then_some(Covered {
                path,
                children,
                range: from..to,
            })
        })
        .collect();
    Ok(covered)
}

fn is_in_block(point: &Point, block: &[usize]) -> bool {
    point.path.len() == block.len() + 1 && point.path.starts_with(block)
}

/// Offset of `point` counted across all inline children of its block.
fn inline_offset(children: &[Node], point: &Point) -> usize {
    let leaf = point.path.last().copied().unwrap_or(0);
    let before: usize = children.iter().take(leaf).map(Node::inline_len).sum();
    match children.get(leaf) {
        Some(Node::Text(t)) => before + clamp_to_char_boundary(&t.text, point.offset),
        Some(node) => before + point.offset.min(node.inline_len()),
        None => before,
    }
}

/// The point at inline `offset` of a block. On a boundary between two text
/// leaves it lands at the start of the second.
fn point_at_inline_offset(block: &[usize], children: &[Node], offset: usize) -> Point {
    let mut remaining = offset;
    for (ix, node) in children.iter().enumerate() {
        let len = node.inline_len();
        match node {
            Node::Text(t) if remaining <= len => {
                let next_is_text = matches!(children.get(ix + 1), Some(Node::Text(_)));
                return if remaining == len && next_is_text {
                    Point::new(child_path(block, ix + 1), 0)
                } else {
                    Point::new(child_path(block, ix), clamp_to_char_boundary(&t.text, remaining))
                };
            }
            Node::Void(_) if remaining < len => break,
            _ => remaining -= len,
        }
    }

    children
        .iter()
        .enumerate()
        .rev()
        .find_map(|(ix, node)| match node {
            Node::Text(t) => Some(Point::new(child_path(block, ix), t.text.len())),
            _ => None,
        })
        .unwrap_or_else(|| Point::new(child_path(block, 0), 0))
}

/// Children of a block with `restyle` applied to the text inside `range`,
/// splitting leaves at its edges.
fn restyle_range(children: &[Node], range: Range<usize>, restyle: &dyn Fn(Marks) -> Marks) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len() + 2);
    let mut cursor = 0;

    for node in children {
        let start = cursor;
        cursor += node.inline_len();
        let Node::Text(t) = node else {
            out.push(node.clone());
            continue;
        };
        if range.end <= start || range.start >= cursor {
            out.push(node.clone());
            continue;
        }

        let cut = |at: usize| clamp_to_char_boundary(&t.text, at.saturating_sub(start));
        let (head, tail) = (cut(range.start), cut(range.end));
        let pieces = [
            (&t.text[..head], t.marks.clone()),
            (&t.text[head..tail], restyle(t.marks.clone())),
            (&t.text[tail..], t.marks.clone()),
        ];
        out.extend(
            pieces
                .into_iter()
                .filter(|(text, _)| !text.is_empty())
                .map(|(text, marks)| Node::text(text, marks)),
        );
    }

    if out.is_empty() {
        out.push(Node::text("", Marks::default()));
    }
    out
}

pub fn active_marks(editor: &Editor) -> Marks {
    match editor.doc().node(&editor.selection().focus.path) {
        Some(Node::Text(text)) => text.marks.clone(),
        _ => Marks::default(),
    }
}

fn every_covered_leaf_has(editor: &Editor, sel: &Selection, flag: MarkFlag) -> Result<bool, String> {
    for block in covered_blocks(editor, sel)? {
        let mut cursor = 0;
        for node in block.children {
            let start = cursor;
            cursor += node.inline_len();
            let overlaps = block.range.start < cursor && start < block.range.end;
            if let Node::Text(t) = node
                && overlaps
                && !flag.is_set(&t.marks)
            {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Rebuilds every covered block with its range restyled, carrying the
/// selection over to the new leaves.
fn restyle_selection(
    editor: &Editor,
    sel: &Selection,
    restyle: &dyn Fn(Marks) -> Marks,
) -> Result<(Vec<Op>, Selection), String> {
    let mut ops = Vec::new();
    let mut after = sel.clone();

    for block in covered_blocks(editor, sel)? {
        let rebuilt = restyle_range(block.children, block.range.clone(), restyle);

        ops.extend((0..block.children.len()).rev().map(|ix| Op::RemoveNode {
            path: child_path(&block.path, ix),
        }));
        ops.extend(insert_run(&block.path, 0, rebuilt.clone()));

        for point in [&mut after.anchor, &mut after.focus] {
            if is_in_block(point, &block.path) {
                let offset = inline_offset(block.children, point);
                *point = point_at_inline_offset(&block.path, &rebuilt, offset);
            }
        }
    }

    Ok((ops, after))
}

/// Splits the leaf under a collapsed caret around an empty leaf with the new
/// marks, so the next typed text picks them up.
fn restyle_caret(
    editor: &Editor,
    restyle: &dyn Fn(Marks) -> Marks,
) -> Result<(Vec<Op>, Selection), String> {
    let focus = &editor.selection().focus;
    let (Some((&leaf_ix, block)), Some(Node::Text(leaf))) =
        (focus.path.split_last(), editor.doc().node(&focus.path))
    else {
        return Err("Selection is not in a text node".into());
    };

    let restyled = restyle(leaf.marks.clone());
    if leaf.text.is_empty() {
        let caret = Point::new(focus.path.clone(), 0);
        let op = Op::SetTextMarks {
            path: focus.path.clone(),
            marks: restyled,
        };
        return Ok((vec![op], Selection::collapsed(caret)));
    }

    let (left, right) = leaf.text.split_at(clamp_to_char_boundary(&leaf.text, focus.offset));
    let caret_ix = if left.is_empty() { leaf_ix } else { leaf_ix + 1 };
    let pieces: Vec<Node> = [
        (left, leaf.marks.clone()),
        ("", restyled),
        (right, leaf.marks.clone()),
    ]
    .into_iter()
    .enumerate()
    .filter(|(ix, (text, _))| *ix == 1 || !text.is_empty())
    .map(|(_, (text, marks))| Node::text(text, marks))
    .collect();

    let caret = Point::new(child_path(block, caret_ix), 0);
    Ok((splice(&focus.path, pieces), Selection::collapsed(caret)))
}

fn set_marks(editor: &Editor, restyle: &dyn Fn(Marks) -> Marks, source: &str) -> Result<Transaction, String> {
    let sel = editor.selection();
    let (ops, selection_after) = if sel.is_collapsed() {
        restyle_caret(editor, restyle)?
    } else {
        restyle_selection(editor, sel, restyle)?
    };
    Ok(Transaction::new(ops)
        .selection_after(selection_after)
        .source(source))
}

/// Marks that are either on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl MarkFlag {
    pub fn is_set(self, marks: &Marks) -> bool {
        match self {
            Self::Bold => marks.bold,
            Self::Italic => marks.italic,
            Self::Underline => marks.underline,
            Self::Strikethrough => marks.strikethrough,
            Self::Code => marks.code,
        }
    }

    fn slot(self, marks: &mut Marks) -> &mut bool {
        match self {
            Self::Bold => &mut marks.bold,
            Self::Italic => &mut marks.italic,
            Self::Underline => &mut marks.underline,
            Self::Strikethrough => &mut marks.strikethrough,
            Self::Code => &mut marks.code,
        }
    }
}

/// Turns `flag` off when the caret leaf or every selected leaf already has
/// it, on otherwise.
pub fn toggle_mark(editor: &Editor, flag: MarkFlag) -> Result<Transaction, String> {
    let sel = editor.selection();
    let on = if sel.is_collapsed() {
        !flag.is_set(&active_marks(editor))
    } else {
        !every_covered_leaf_has(editor, sel, flag)?
    };
    set_marks(
        editor,
        &|mut marks: Marks| {
            *flag.slot(&mut marks) = on;
            marks
        },
        &format!("command:marks.toggle_{}", format!("{flag:?}").to_lowercase()),
    )
}

pub fn set_link(editor: &Editor, url: String) -> Result<Transaction, String> {
    set_marks(
        editor,
        &|marks: Marks| Marks {
            link: Some(url.clone()),
            ..marks
        },
        "command:marks.set_link",
    )
}

pub fn unset_link(editor: &Editor) -> Result<Transaction, String> {
    set_marks(editor, &|marks: Marks| Marks { link: None, ..marks }, "command:marks.unset_link")
}
