//! Portable form of a document: HTML in, HTML out, and the Base64 text
//! payload that carries it between sessions.

pub mod codec;
pub mod convert;
pub mod dom;
pub mod layout;
pub mod pipeline;
pub mod sanitize;

pub use crate::codec::{
    DecodeError, Decoded, EncodeMode, PayloadFormat, decode, decode_detailed, encode,
};
pub use crate::convert::{IMAGE_KEY_ATTR, document_to_html, html_to_document, nodes_to_blocks};
pub use crate::dom::{HtmlAttribute, HtmlElement, HtmlNode, parse_fragment, serialize};
pub use crate::layout::{STYLE_GUIDE_CSS, normalize_layout, normalize_nodes};
pub use crate::pipeline::{
    clean_html, decode_to_html, export_document, export_html, import_html, import_payload,
};
pub use crate::sanitize::sanitize;
