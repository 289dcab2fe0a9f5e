use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Name given to images that arrive without one.
pub const PASTED_IMAGE_NAME: &str = "pasted-image.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| PASTED_IMAGE_NAME.to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Ok(Self::new(name, mime.essence_str(), bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Where an image ended up: on the remote host or inline in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    Hosted(String),
    Embedded(String),
}

impl ImageReference {
    pub fn src(&self) -> &str {
        match self {
            ImageReference::Hosted(src) | ImageReference::Embedded(src) => src,
        }
    }

    pub fn into_src(self) -> String {
        match self {
            ImageReference::Hosted(src) | ImageReference::Embedded(src) => src,
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, ImageReference::Hosted(_))
    }
}

pub fn is_data_uri(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}
