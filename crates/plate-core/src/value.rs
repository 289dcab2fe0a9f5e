//! Versioned JSON form of a document.

use serde::{Deserialize, Serialize};

use crate::node::Document;

pub const DOCUMENT_SCHEMA: &str = "manos-document";
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("malformed document value: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown document schema {0:?}")]
    UnknownSchema(String),
    #[error("document version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// A document with the schema header it is stored under. A missing header
/// reads as the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateValue {
    #[serde(default = "current_schema")]
    pub schema: String,
    #[serde(default = "current_version")]
    pub version: u32,
    pub document: Document,
}

fn current_schema() -> String {
    DOCUMENT_SCHEMA.to_string()
}

fn current_version() -> u32 {
    DOCUMENT_VERSION
}

impl PlateValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: current_schema(),
            version: current_version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and checks the header. Older versions are accepted as is.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value: Self = serde_json::from_str(s)?;
        if value.schema != DOCUMENT_SCHEMA {
            return Err(ValueError::UnknownSchema(value.schema));
        }
        if value.version > DOCUMENT_VERSION {
            return Err(ValueError::UnsupportedVersion {
                found: value.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(value)
    }
}
