//! Plugins contribute node kinds, normalize passes, commands and queries to a
//! [`PluginRegistry`]. The editor consults the registry for everything
//! kind-specific.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;

use serde_json::Value;

use crate::editor::Editor;
use crate::node::{Document, ElementKind, Marks, Node, NodeKind, VoidKind};
use crate::ops::{Op, Path, Transaction};
use crate::schema::{ChildConstraint, NodeRole, NodeSpec, SchemaError, validate_document};
use crate::transforms::{
    BlockScope, MarkFlag, active_block_attr, active_heading_level, active_list_type,
    active_marks, child_path, delete_focused_block, delete_nearest_two_col, insert_blocks,
    insert_image, insert_text, insert_two_col, nearest_element_path, set_block_attr,
    set_heading, set_link, toggle_list, toggle_mark, unset_heading, unset_link,
    unwrap_list_item, unwrap_nearest_blockquote, unwrap_nearest_two_col,
    wrap_selection_in_blockquote,
};
use crate::tree::{AttrPatch, Point, Selection};

pub const ALIGN_VALUES: [&str; 4] = ["left", "center", "right", "justify"];
pub const DIR_VALUES: [&str; 3] = ["ltr", "rtl", "auto"];
pub const LIST_TYPES: [&str; 2] = ["bulleted", "ordered"];

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for QueryError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

type CommandHandler =
    dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync;
type QueryHandler = dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    /// Human name, also used in failure messages.
    pub label: String,
    pub handler: Arc<CommandHandler>,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: Arc<QueryHandler>,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

/// One normalization rule. `run` returns the ops that fix the first batch of
/// violations it finds in `doc`, all addressed against `doc` as given.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;

    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }

    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }

    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<NodeKind, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    /// Fails when two plugins claim the same node kind, command or query.
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    /// Paragraphs, hard breaks, structural normalization and text editing.
    pub fn core() -> Self {
        Self::new(core_plugins()).expect("core plugins are disjoint")
    }

    /// The full document editor, two-column layout included.
    pub fn richtext() -> Self {
        let mut plugins = core_plugins();
        plugins.extend([
            Box::new(MarksPlugin) as Box<dyn PlatePlugin>,
            Box::new(HeadingPlugin),
            Box::new(ListPlugin),
            Box::new(BlockquotePlugin),
            Box::new(AlignPlugin),
            Box::new(DirectionPlugin),
            Box::new(ImagePlugin),
            Box::new(TwoColumnPlugin),
        ]);
        Self::new(plugins).expect("richtext plugins are disjoint")
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), String> {
        for spec in plugin.node_specs() {
            claim(&mut self.node_specs, spec.kind, spec, "node kind")?;
        }
        for command in plugin.commands() {
            claim(&mut self.commands, command.id.clone(), command, "command")?;
        }
        for query in plugin.queries() {
            claim(&mut self.queries, query.id.clone(), query, "query")?;
        }
        self.normalize_passes.extend(plugin.normalize_passes());

        log::trace!("registered plugin {}", plugin.id());
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<NodeKind, NodeSpec> {
        &self.node_specs
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    /// Registered command ids, sorted.
    pub fn command_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.commands.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_known_kind(&self, kind: NodeKind) -> bool {
        self.node_specs.contains_key(&kind)
    }

    /// Whether elements of `kind` hold inline content.
    pub fn is_text_block(&self, kind: ElementKind) -> bool {
        self.children_of(kind) == Some(&ChildConstraint::InlineOnly)
    }

    fn children_of(&self, kind: ElementKind) -> Option<&ChildConstraint> {
        self.node_specs
            .get(&NodeKind::Element(kind))
            .map(|spec| &spec.children)
    }

    pub fn validate(&self, doc: &Document) -> Result<(), SchemaError> {
        validate_document(doc, self)
    }

    /// Ops of the first pass that has work. Passes address the same
    /// snapshot, so a second pass could see stale paths.
    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        self.normalize_passes
            .iter()
            .map(|pass| (pass.id(), pass.run(doc, self)))
            .find(|(_, ops)| !ops.is_empty())
            .map(|(id, ops)| {
                log::trace!("normalize pass {id} produced {} ops", ops.len());
                ops
            })
            .unwrap_or_default()
    }

    /// Snaps both points onto existing text leaves. A point that cannot be
    /// placed follows the other one; with neither, the caret goes to the first
    /// text in the document.
    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        match (nearest_text_point(doc, &selection.anchor), nearest_text_point(doc, &selection.focus)) {
            (Some(anchor), Some(focus)) => Selection { anchor, focus },
            (Some(point), None) | (None, Some(point)) => Selection::collapsed(point),
            (None, None) => Selection::collapsed(
                first_text_below(&doc.children, Vec::new()).unwrap_or(Point::new(vec![0], 0)),
            ),
        }
    }
}

fn core_plugins() -> Vec<Box<dyn PlatePlugin>> {
    vec![
        Box::new(ParagraphPlugin),
        Box::new(StructurePlugin),
        Box::new(TextCommandsPlugin),
    ]
}

fn claim<K: Eq + Hash + Debug, V>(
    map: &mut HashMap<K, V>,
    key: K,
    value: V,
    what: &str,
) -> Result<(), String> {
    match map.entry(key) {
        Entry::Occupied(taken) => Err(format!("{what} {:?} is registered twice", taken.key())),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

fn first_text_below(nodes: &[Node], prefix: Path) -> Option<Point> {
    nodes.iter().enumerate().find_map(|(ix, node)| {
        let path = child_path(&prefix, ix);
        match node {
            Node::Text(_) => Some(Point::new(path, 0)),
            Node::Element(el) => first_text_below(&el.children, path),
            Node::Void(_) => None,
        }
    })
}

/// Follows `point.path` as far as the tree allows, clamping each index to
/// the last child, then settles on the first text leaf under where it
/// stopped. `None` when that lands on a void or nothing.
fn nearest_text_point(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() {
        return None;
    }

    let mut path = Vec::with_capacity(point.path.len());
    let mut siblings = doc.children.as_slice();
    for &wanted in &point.path {
        let Some(last) = siblings.len().checked_sub(1) else {
            break;
        };
        let ix = wanted.min(last);
        path.push(ix);
        match &siblings[ix] {
            Node::Text(leaf) => return Some(Point::new(path, point.offset.min(leaf.text.len()))),
            Node::Element(el) => siblings = &el.children,
            Node::Void(_) => return None,
        }
    }

    match doc.node(&path)? {
        Node::Element(el) => first_text_below(&el.children, path),
        Node::Text(_) | Node::Void(_) => None,
    }
}

/// Command arguments: a JSON object, or nothing.
#[derive(Clone, Copy)]
struct Args<'a>(Option<&'a Value>);

impl<'a> Args<'a> {
    fn get(self, key: &str) -> Option<&'a Value> {
        self.0?.get(key)
    }

    /// Trimmed, non-empty string argument.
    fn text(self, key: &str) -> Option<&'a str> {
        self.get(key)?
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn required(self, key: &str) -> Result<&'a str, CommandError> {
        self.text(key)
            .ok_or_else(|| CommandError::new(format!("Missing args.{key}")))
    }

    fn one_of(self, key: &str, allowed: &[&str]) -> Result<&'a str, CommandError> {
        let value = self.required(key)?;
        if !allowed.contains(&value) {
            return Err(CommandError::new(format!("Invalid {key} value: {value}")));
        }
        Ok(value)
    }

    fn scope(self) -> Result<BlockScope, String> {
        match self.text("scope") {
            None | Some("block") => Ok(BlockScope::Block),
            Some("column") => Ok(BlockScope::Column),
            Some(other) => Err(format!("Unknown scope: {other}")),
        }
    }
}

/// A command that builds one transaction and applies it. Empty transactions
/// are skipped.
fn tx_command(
    id: &'static str,
    label: &'static str,
    build: impl Fn(&Editor, Args<'_>) -> Result<Transaction, CommandError> + Send + Sync + 'static,
) -> CommandSpec {
    CommandSpec::new(id, label, move |editor, args| {
        let tx = build(editor, Args(args.as_ref()))?;
        if tx.ops.is_empty() {
            return Ok(());
        }
        editor
            .apply(tx)
            .map_err(|err| CommandError::new(format!("Failed to {}: {err}", label.to_lowercase())))
    })
}

fn mark_command(id: &'static str, label: &'static str, flag: MarkFlag) -> CommandSpec {
    tx_command(id, label, move |editor, _| Ok(toggle_mark(editor, flag)?))
}

fn bool_query(id: &'static str, read: fn(&Editor) -> bool) -> QuerySpec {
    QuerySpec::new(id, move |editor, _| Ok(Value::Bool(read(editor))))
}

fn block_attr_query(id: &'static str, key: &'static str) -> QuerySpec {
    QuerySpec::new(id, move |editor, args| {
        let scope = Args(args.as_ref()).scope()?;
        Ok(active_block_attr(editor, key, scope))
    })
}

fn inside(editor: &Editor, kind: ElementKind) -> bool {
    nearest_element_path(editor.doc(), &editor.selection().focus.path, kind).is_some()
}

fn set_attr_op(path: Path, key: &str, value: impl Into<Value>) -> Op {
    Op::SetNodeAttrs {
        path,
        patch: AttrPatch::set(key, value),
    }
}

struct ParagraphPlugin;

impl PlatePlugin for ParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block(ElementKind::Paragraph, ChildConstraint::InlineOnly),
            NodeSpec::void(VoidKind::HardBreak, NodeRole::Inline),
        ]
    }
}

/// Structural rules every document obeys regardless of which kinds are
/// registered.
struct StructurePlugin;

impl PlatePlugin for StructurePlugin {
    fn id(&self) -> &'static str {
        "core.structure"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(NonEmptyDocument),
            Box::new(NonEmptyContainers),
            Box::new(TextBlocksHaveText),
            Box::new(MergeEqualLeaves),
        ]
    }
}

struct NonEmptyDocument;

impl NormalizePass for NonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if !doc.children.is_empty() {
            return Vec::new();
        }
        vec![Op::InsertNode {
            path: vec![0],
            node: Node::paragraph(""),
        }]
    }
}

/// Blockquotes and columns left without blocks get an empty paragraph.
struct NonEmptyContainers;

impl NormalizePass for NonEmptyContainers {
    fn id(&self) -> &'static str {
        "core.non_empty_containers"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        doc.elements()
            .into_iter()
            .filter(|(_, el)| {
                el.children.is_empty()
                    && registry.children_of(el.kind) == Some(&ChildConstraint::BlockOnly)
            })
            .map(|(path, _)| Op::InsertNode {
                path: child_path(&path, 0),
                node: Node::paragraph(""),
            })
            .collect()
    }
}

/// Text blocks always keep at least one text leaf for the caret.
struct TextBlocksHaveText;

impl NormalizePass for TextBlocksHaveText {
    fn id(&self) -> &'static str {
        "core.text_blocks_have_text"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        doc.elements()
            .into_iter()
            .filter(|(_, el)| {
                registry.is_text_block(el.kind)
                    && !el.children.iter().any(|child| matches!(child, Node::Text(_)))
            })
            .map(|(path, _)| Op::InsertNode {
                path: child_path(&path, 0),
                node: Node::text("", Marks::default()),
            })
            .collect()
    }
}

/// Folds runs of adjacent text leaves with equal marks into their first leaf.
struct MergeEqualLeaves;

impl NormalizePass for MergeEqualLeaves {
    fn id(&self) -> &'static str {
        "core.merge_equal_leaves"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (path, el) in doc.elements() {
            if !registry.is_text_block(el.kind) {
                continue;
            }
            // Right to left, so earlier indices stay valid.
            for run in equal_mark_runs(&el.children).into_iter().rev() {
                let Node::Text(head) = &el.children[run.start] else {
                    continue;
                };
                let tail: String = el.children[run.start + 1..run.end]
                    .iter()
                    .filter_map(|node| match node {
                        Node::Text(leaf) => Some(leaf.text.as_str()),
                        _ => None,
                    })
                    .collect();
                if !tail.is_empty() {
                    ops.push(Op::InsertText {
                        path: child_path(&path, run.start),
                        offset: head.text.len(),
                        text: tail,
                    });
                }
                ops.extend(
                    (run.start + 1..run.end)
                        .rev()
                        .map(|ix| Op::RemoveNode {
                            path: child_path(&path, ix),
                        }),
                );
            }
        }
        ops
    }
}

/// Index ranges covering two or more consecutive text leaves with equal
/// marks.
fn equal_mark_runs(children: &[Node]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < children.len() {
        let Node::Text(head) = &children[start] else {
            start += 1;
            continue;
        };
        let followers = children[start + 1..]
            .iter()
            .take_while(|node| matches!(node, Node::Text(leaf) if leaf.marks == head.marks))
            .count();
        if followers > 0 {
            runs.push(start..start + followers + 1);
        }
        start += followers + 1;
    }
    runs
}

struct TextCommandsPlugin;

impl PlatePlugin for TextCommandsPlugin {
    fn id(&self) -> &'static str {
        "core.commands"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("text.insert", "Insert text", |editor, args| {
                let text = args
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CommandError::new("Missing args.text"))?;
                Ok(insert_text(editor, text.to_string())?)
            }),
            tx_command("block.delete", "Delete block", |editor, _| {
                Ok(delete_focused_block(editor)?)
            }),
            tx_command("blocks.insert", "Insert blocks", |editor, args| {
                let nodes = args
                    .get("nodes")
                    .ok_or_else(|| CommandError::new("Missing args.nodes"))?;
                let nodes: Vec<Node> = serde_json::from_value(nodes.clone())
                    .map_err(|err| CommandError::new(format!("Invalid args.nodes: {err}")))?;
                if nodes.is_empty() {
                    return Ok(Transaction::default());
                }
                Ok(insert_blocks(editor, nodes)?)
            }),
        ]
    }
}

struct MarksPlugin;

impl PlatePlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            mark_command("marks.toggle_bold", "Toggle bold", MarkFlag::Bold),
            mark_command("marks.toggle_italic", "Toggle italic", MarkFlag::Italic),
            mark_command("marks.toggle_underline", "Toggle underline", MarkFlag::Underline),
            mark_command(
                "marks.toggle_strikethrough",
                "Toggle strikethrough",
                MarkFlag::Strikethrough,
            ),
            mark_command("marks.toggle_code", "Toggle code", MarkFlag::Code),
            tx_command("marks.set_link", "Set link", |editor, args| {
                let url = args.required("url")?;
                Ok(set_link(editor, url.to_string())?)
            }),
            tx_command("marks.unset_link", "Unset link", |editor, _| {
                Ok(unset_link(editor)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.get_active", |editor, _| {
                serde_json::to_value(active_marks(editor))
                    .map_err(|err| QueryError::new(format!("Could not encode marks: {err}")))
            }),
            bool_query("marks.is_bold_active", |editor| active_marks(editor).bold),
            bool_query("marks.is_italic_active", |editor| active_marks(editor).italic),
            bool_query("marks.has_link_active", |editor| {
                active_marks(editor).link.is_some()
            }),
        ]
    }
}

struct HeadingPlugin;

impl PlatePlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::block(ElementKind::Heading, ChildConstraint::InlineOnly)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(HeadingLevels)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("block.set_heading", "Set heading", |editor, args| {
                let level = args.get("level").and_then(Value::as_u64).unwrap_or(1);
                Ok(set_heading(editor, level.clamp(1, 6))?)
            }),
            tx_command("block.unset_heading", "Unset heading", |editor, _| {
                Ok(unset_heading(editor)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.heading_level", |editor, _| {
            Ok(active_heading_level(editor))
        })]
    }
}

/// Heading levels are integers from 1 to 6.
struct HeadingLevels;

impl NormalizePass for HeadingLevels {
    fn id(&self) -> &'static str {
        "heading.levels"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.elements()
            .into_iter()
            .filter(|(_, el)| el.kind == ElementKind::Heading)
            .filter_map(|(path, el)| {
                let current = el.attrs.get("level").and_then(Value::as_u64);
                let level = current.unwrap_or(1).clamp(1, 6);
                (current != Some(level)).then(|| set_attr_op(path, "level", level))
            })
            .collect()
    }
}

struct ListPlugin;

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::block(ElementKind::ListItem, ChildConstraint::InlineOnly)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(ListTypes)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("list.toggle_bulleted", "Toggle bulleted list", |editor, _| {
                Ok(toggle_list(editor, "bulleted")?)
            }),
            tx_command("list.toggle_ordered", "Toggle ordered list", |editor, _| {
                Ok(toggle_list(editor, "ordered")?)
            }),
            tx_command("list.unwrap", "Unwrap list item", |editor, _| {
                Ok(unwrap_list_item(editor)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.active_type", |editor, _| {
                Ok(active_list_type(editor).map_or(Value::Null, Value::String))
            }),
            QuerySpec::new("list.is_active", |editor, args| {
                let wanted = Args(args.as_ref())
                    .text("type")
                    .ok_or_else(|| QueryError::new("Missing args.type"))?;
                let active = active_list_type(editor);
                Ok(Value::Bool(active.as_deref() == Some(wanted)))
            }),
        ]
    }
}

/// List items without a known `list_type` become bulleted.
struct ListTypes;

impl NormalizePass for ListTypes {
    fn id(&self) -> &'static str {
        "list.types"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.elements()
            .into_iter()
            .filter(|(_, el)| {
                el.kind == ElementKind::ListItem
                    && !el
                        .attr_str("list_type")
                        .is_some_and(|list_type| LIST_TYPES.contains(&list_type))
            })
            .map(|(path, _)| set_attr_op(path, "list_type", LIST_TYPES[0]))
            .collect()
    }
}

struct BlockquotePlugin;

impl PlatePlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::block(ElementKind::Blockquote, ChildConstraint::BlockOnly)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("blockquote.wrap_selection", "Wrap in blockquote", |editor, _| {
                Ok(wrap_selection_in_blockquote(editor)?)
            }),
            tx_command("blockquote.unwrap", "Unwrap blockquote", |editor, _| {
                Ok(unwrap_nearest_blockquote(editor)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![bool_query("blockquote.is_active", |editor| {
            inside(editor, ElementKind::Blockquote)
        })]
    }
}

/// Drops `key` from elements that may not carry it, and values outside
/// `allowed`. The `default` value is dropped as well since it renders the
/// same as no attribute.
struct BlockAttrRule {
    id: &'static str,
    key: &'static str,
    allowed: &'static [&'static str],
    default: Option<&'static str>,
    carriers: &'static [ElementKind],
}

impl NormalizePass for BlockAttrRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.elements()
            .into_iter()
            .filter(|(_, el)| {
                let Some(value) = el.attrs.get(self.key) else {
                    return false;
                };
                let acceptable = value
                    .as_str()
                    .is_some_and(|value| self.allowed.contains(&value) && Some(value) != self.default);
                !(acceptable && self.carriers.contains(&el.kind))
            })
            .map(|(path, _)| Op::SetNodeAttrs {
                path,
                patch: AttrPatch::remove(self.key),
            })
            .collect()
    }
}

const ALIGN_CARRIERS: &[ElementKind] = &[
    ElementKind::Paragraph,
    ElementKind::Heading,
    ElementKind::ListItem,
    ElementKind::TwoColLeft,
    ElementKind::TwoColRight,
];

const DIR_CARRIERS: &[ElementKind] = &[
    ElementKind::Paragraph,
    ElementKind::Heading,
    ElementKind::ListItem,
    ElementKind::Blockquote,
    ElementKind::TwoColLeft,
    ElementKind::TwoColRight,
];

struct AlignPlugin;

impl PlatePlugin for AlignPlugin {
    fn id(&self) -> &'static str {
        "align"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(BlockAttrRule {
            id: "block.align_attrs",
            key: "align",
            allowed: &ALIGN_VALUES,
            default: Some("left"),
            carriers: ALIGN_CARRIERS,
        })]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![tx_command("block.set_align", "Set alignment", |editor, args| {
            let align = args.one_of("align", &ALIGN_VALUES)?;
            let value = (align != "left").then(|| align.to_string());
            Ok(set_block_attr(editor, "align", value, args.scope()?, ALIGN_CARRIERS)?)
        })]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![block_attr_query("block.align", "align")]
    }
}

struct DirectionPlugin;

impl PlatePlugin for DirectionPlugin {
    fn id(&self) -> &'static str {
        "direction"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(BlockAttrRule {
            id: "block.dir_attrs",
            key: "dir",
            allowed: &DIR_VALUES,
            default: None,
            carriers: DIR_CARRIERS,
        })]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("block.set_dir", "Set text direction", |editor, args| {
                let dir = args.one_of("dir", &DIR_VALUES)?.to_string();
                Ok(set_block_attr(editor, "dir", Some(dir), args.scope()?, DIR_CARRIERS)?)
            }),
            tx_command("block.unset_dir", "Unset text direction", |editor, args| {
                Ok(set_block_attr(editor, "dir", None, args.scope()?, DIR_CARRIERS)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![block_attr_query("block.dir", "dir")]
    }
}

struct ImagePlugin;

impl PlatePlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void(VoidKind::Image, NodeRole::Block)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![tx_command("image.insert", "Insert image", |editor, args| {
            let src = args.required("src")?.to_string();
            let alt = args.text("alt").map(str::to_string);
            let key = args.text("key").map(str::to_string);
            Ok(insert_image(editor, src, alt, key)?)
        })]
    }
}

struct TwoColumnPlugin;

impl PlatePlugin for TwoColumnPlugin {
    fn id(&self) -> &'static str {
        "two_col"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        let column = |kind| {
            NodeSpec::block(kind, ChildConstraint::BlockOnly)
                .only_inside([ElementKind::TwoColContainer])
        };
        vec![
            NodeSpec::block(
                ElementKind::TwoColContainer,
                ChildConstraint::Sequence(vec![
                    NodeKind::Element(ElementKind::TwoColLeft),
                    NodeKind::Element(ElementKind::TwoColRight),
                ]),
            ),
            column(ElementKind::TwoColLeft),
            column(ElementKind::TwoColRight),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            tx_command("two_col.insert", "Insert two-column layout", |editor, _| {
                Ok(insert_two_col(editor)?)
            }),
            tx_command("two_col.delete", "Delete two-column layout", |editor, _| {
                Ok(delete_nearest_two_col(editor)?)
            }),
            tx_command("two_col.unwrap", "Unwrap two-column layout", |editor, _| {
                Ok(unwrap_nearest_two_col(editor)?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![bool_query("two_col.is_active", |editor| {
            inside(editor, ElementKind::TwoColContainer)
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_mark_runs_skip_singletons_and_voids() {
        let bold = Marks {
            bold: true,
            ..Marks::default()
        };
        let children = vec![
            Node::text("a", Marks::default()),
            Node::text("b", Marks::default()),
            Node::text("c", bold.clone()),
            Node::hard_break(),
            Node::text("d", bold.clone()),
            Node::text("e", bold.clone()),
            Node::text("f", bold),
        ];

        assert_eq!(equal_mark_runs(&children), vec![0..2, 4..7]);
    }

    #[test]
    fn duplicate_commands_are_refused() {
        let plugins: Vec<Box<dyn PlatePlugin>> =
            vec![Box::new(TextCommandsPlugin), Box::new(TextCommandsPlugin)];
        let err = PluginRegistry::new(plugins).err().unwrap();
        assert!(err.contains("registered twice"), "{err}");
    }

    #[test]
    fn selection_outside_the_tree_snaps_back_onto_text() {
        let registry = PluginRegistry::richtext();
        let doc = Document {
            children: vec![Node::paragraph("abc"), Node::two_col()],
        };

        let far = Selection::collapsed(Point::new(vec![9, 9, 9, 9], 99));
        assert_eq!(
            registry.normalize_selection(&doc, &far),
            Selection::collapsed(Point::new(vec![1, 1, 0, 0], 0))
        );

        let short = Selection::collapsed(Point::new(vec![0], 2));
        assert_eq!(
            registry.normalize_selection(&doc, &short).focus,
            Point::new(vec![0, 0], 0)
        );
    }
}
