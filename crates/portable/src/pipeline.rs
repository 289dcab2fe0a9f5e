//! End-to-end import and export between documents and portable payloads.

use manos_plate_core::Document;

use crate::codec::{self, DecodeError, EncodeMode};
use crate::convert::{document_to_html, html_to_document};
use crate::layout::normalize_layout;
use crate::sanitize::sanitize;

/// Document → HTML with the layout contract applied.
pub fn export_html(doc: &Document) -> String {
    normalize_layout(&document_to_html(doc))
}

pub fn export_document(doc: &Document, mode: EncodeMode) -> String {
    codec::encode(&export_html(doc), mode)
}

/// Sanitized, layout-normalized HTML for untrusted input.
pub fn clean_html(html: &str) -> String {
    normalize_layout(&sanitize(html))
}

pub fn import_html(html: &str) -> Document {
    html_to_document(&clean_html(html))
}

pub fn import_payload(payload: &str) -> Result<Document, DecodeError> {
    let decoded = codec::decode_detailed(payload)?;
    log::debug!(
        "importing {} bytes of HTML from {:?} payload",
        decoded.html.len(),
        decoded.format
    );
    Ok(import_html(&decoded.html))
}

/// Decodes a payload to the HTML an editor would load: sanitized and
/// layout-normalized, but not yet converted to a document.
pub fn decode_to_html(payload: &str) -> Result<String, DecodeError> {
    codec::decode(payload).map(|html| clean_html(&html))
}
