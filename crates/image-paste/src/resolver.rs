use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::UploadConfig;
use crate::error::ImageError;
use crate::host::{HttpFetcher, ImageFetcher, ImageHost, ImgBbHost};
use crate::source::{ImageFile, ImageReference, is_data_uri};

/// Turns image sources into durable references, falling back instead of
/// failing.
///
/// A missing credential is remembered: once the host reports it, no further
/// upload is attempted for the lifetime of the resolver.
pub struct ImageResolver {
    host: Arc<dyn ImageHost>,
    fetcher: Arc<dyn ImageFetcher>,
    config: UploadConfig,
    uploads_disabled: AtomicBool,
}

impl ImageResolver {
    pub fn new(
        host: Arc<dyn ImageHost>,
        fetcher: Arc<dyn ImageFetcher>,
        config: UploadConfig,
    ) -> Self {
        Self {
            host,
            fetcher,
            config,
            uploads_disabled: AtomicBool::new(false),
        }
    }

    /// ImgBB upload plus plain HTTP fetching.
    pub fn from_config(config: UploadConfig) -> Self {
        let host = Arc::new(ImgBbHost::new(config.clone()));
        Self::new(host, Arc::new(HttpFetcher::default()), config)
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn uploads_disabled(&self) -> bool {
        self.uploads_disabled.load(Ordering::Relaxed)
    }

    pub async fn upload(&self, file: &ImageFile) -> Result<String, ImageError> {
        if self.uploads_disabled() {
            return Err(ImageError::UploadCredentialMissing);
        }

        let result = self.host.upload(file).await;
        if let Err(ImageError::UploadCredentialMissing) = result {
            if !self.uploads_disabled.swap(true, Ordering::Relaxed) {
                log::warn!("image host credential missing, uploads disabled for this session");
            }
        }
        result
    }

    /// Uploads a local file, embedding it as a data URI when that fails.
    pub async fn resolve_file(&self, file: &ImageFile) -> ImageReference {
        match self.upload(file).await {
            Ok(url) => ImageReference::Hosted(url),
            Err(err) => {
                log::warn!("embedding {} instead of hosting it: {err}", file.name);
                ImageReference::Embedded(file.to_data_uri())
            }
        }
    }

    /// Re-hosts a remote image. `None` means the original `src` stays.
    pub async fn resolve_remote(&self, src: &str) -> Option<String> {
        if !self.needs_rehost(src) {
            return None;
        }

        let file = match self.fetcher.fetch(src).await {
            Ok(file) => file,
            Err(err) => {
                log::warn!("keeping original image source: {err}");
                return None;
            }
        };

        match self.upload(&file).await {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("keeping original image source {src}: {err}");
                None
            }
        }
    }

    /// Only absolute http(s) images outside the trusted hosts are re-hosted.
    pub fn needs_rehost(&self, src: &str) -> bool {
        if src.trim().is_empty() || is_data_uri(src) {
            return false;
        }
        let Ok(url) = reqwest::Url::parse(src.trim()) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        url.host_str()
            .is_some_and(|host| !self.config.is_trusted_host(host))
    }
}
