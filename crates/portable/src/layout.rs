//! Post-processing of two-column markup so exported HTML carries the
//! `two-col-*` class contract and renders without the editor's stylesheet.

use crate::dom::{HtmlElement, HtmlNode, parse_fragment, serialize};

pub const CONTAINER_CLASS: &str = "two-col-container";
pub const COLUMN_CLASS: &str = "two-col-column";
pub const LEFT_CLASS: &str = "two-col-left";
pub const RIGHT_CLASS: &str = "two-col-right";

pub const TABLE_CLASS: &str = "two-col-table";
pub const TBODY_CLASS: &str = "two-col-tbody";
pub const ROW_CLASS: &str = "two-col-row";
pub const LEFT_CELL_CLASS: &str = "two-col-left-td";
pub const RIGHT_CELL_CLASS: &str = "two-col-right-td";

const CONTAINER_STYLE: &[(&str, &str)] = &[("display", "flex"), ("gap", "1rem"), ("width", "100%")];
const COLUMN_STYLE: &[(&str, &str)] = &[
    ("flex", "1 1 0%"),
    ("min-width", "0"),
    ("vertical-align", "top"),
];
const TABLE_STYLE: &[(&str, &str)] = &[("width", "100%"), ("border-collapse", "collapse")];
const CELL_STYLE: &[(&str, &str)] = &[("width", "50%"), ("vertical-align", "top")];

/// Companion stylesheet for the `two-col-*` classes.
pub const STYLE_GUIDE_CSS: &str = r#"/* Stack columns on mobile */
@media (max-width: 768px) {
  .two-col-container {
    display: block !important;
  }

  .two-col-table,
  .two-col-tbody,
  .two-col-row,
  .two-col-left-td,
  .two-col-right-td,
  .two-col-column {
    display: block !important;
    width: 100% !important;
  }

  .two-col-left-td,
  .two-col-right-td,
  .two-col-column {
    padding: 10px 0 !important;
  }
}

/* Desktop Styles */
.two-col-container {
  display: flex;
  gap: 1rem;
  width: 100%;
}

.two-col-column {
  flex: 1 1 0%;
  min-width: 0;
  vertical-align: top;
}

.two-col-table {
  width: 100%;
  border-collapse: collapse;
}

.two-col-left-td,
.two-col-right-td {
  vertical-align: top;
  padding: 15px;
}
"#;

/// Applies the class and inline-style contract to every recognized
/// two-column structure. Idempotent.
pub fn normalize_layout(html: &str) -> String {
    let mut nodes = parse_fragment(html);
    normalize_nodes(&mut nodes);
    serialize(&nodes)
}

pub fn normalize_nodes(nodes: &mut [HtmlNode]) {
    for node in nodes {
        if let HtmlNode::Element(el) = node {
            normalize_element(el);
        }
    }
}

fn normalize_element(el: &mut HtmlElement) {
    if is_div_container(el) {
        normalize_div_container(el);
    } else if is_two_col_table(el) {
        normalize_table(el);
    }
    normalize_nodes(&mut el.children);
}

pub fn is_div_container(el: &HtmlElement) -> bool {
    el.tag == "div" && el.has_class(CONTAINER_CLASS)
}

pub fn is_two_col_table(el: &HtmlElement) -> bool {
    el.tag == "table"
        && (el.has_class(TABLE_CLASS) || first_row(el).is_some_and(|row| cells(row).count() == 2))
}

pub fn first_row(table: &HtmlElement) -> Option<&HtmlElement> {
    for child in table.element_children() {
        match child.tag.as_str() {
            "tr" => return Some(child),
            "thead" | "tbody" | "tfoot" => {
                if let Some(row) = child.element_children().find(|el| el.tag == "tr") {
                    return Some(row);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn cells(row: &HtmlElement) -> impl Iterator<Item = &HtmlElement> {
    row.element_children()
        .filter(|el| matches!(el.tag.as_str(), "td" | "th"))
}

fn strip_borders(el: &mut HtmlElement) {
    el.retain_style(|name, _| !name.starts_with("border") || name == "border-collapse");
}

fn apply_style(el: &mut HtmlElement, declarations: &[(&str, &str)]) {
    for (name, value) in declarations {
        el.set_style_property(name, value);
    }
}

fn normalize_div_container(container: &mut HtmlElement) {
    strip_borders(container);
    apply_style(container, CONTAINER_STYLE);

    let columns = container
        .element_children_mut()
        .filter(|el| el.tag == "div")
        .take(2);
    for (ix, column) in columns.enumerate() {
        let (side, other) = if ix == 0 {
            (LEFT_CLASS, RIGHT_CLASS)
        } else {
            (RIGHT_CLASS, LEFT_CLASS)
        };
        column.add_class(COLUMN_CLASS);
        column.remove_class(other);
        column.add_class(side);
        strip_borders(column);
        apply_style(column, COLUMN_STYLE);
    }
}

fn normalize_table(table: &mut HtmlElement) {
    table.add_class(TABLE_CLASS);
    strip_borders(table);
    apply_style(table, TABLE_STYLE);

    for section in table.element_children_mut() {
        match section.tag.as_str() {
            "tr" => normalize_row(section),
            "tbody" | "thead" | "tfoot" => {
                if section.tag == "tbody" {
                    section.add_class(TBODY_CLASS);
                }
                for row in section.element_children_mut().filter(|el| el.tag == "tr") {
                    normalize_row(row);
                }
            }
            _ => {}
        }
    }
}

fn normalize_row(row: &mut HtmlElement) {
    row.add_class(ROW_CLASS);
    let cells = row
        .element_children_mut()
        .filter(|el| matches!(el.tag.as_str(), "td" | "th"));
    for (ix, cell) in cells.enumerate() {
        strip_borders(cell);
        let (side, other) = match ix {
            0 => (LEFT_CELL_CLASS, RIGHT_CELL_CLASS),
            1 => (RIGHT_CELL_CLASS, LEFT_CELL_CLASS),
            _ => continue,
        };
        cell.remove_class(other);
        cell.add_class(side);
        apply_style(cell, CELL_STYLE);
    }
}
