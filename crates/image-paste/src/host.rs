//! Network seams of the image pipeline: the upload host and the fetcher for
//! remote images found in pasted HTML.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::error::ImageError;
use crate::source::{ImageFile, PASTED_IMAGE_NAME};

#[async_trait::async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads `file` and returns its durable URL.
    async fn upload(&self, file: &ImageFile) -> Result<String, ImageError>;
}

#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ImageFile, ImageError>;
}

/// Uploads to ImgBB's `/1/upload` endpoint.
pub struct ImgBbHost {
    client: reqwest::Client,
    config: UploadConfig,
}

impl ImgBbHost {
    pub fn new(config: UploadConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: UploadConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ImageHost for ImgBbHost {
    async fn upload(&self, file: &ImageFile) -> Result<String, ImageError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ImageError::UploadCredentialMissing)?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|err| ImageError::UploadNetworkError(err.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[
                ("expiration", self.config.expiration_secs.to_string()),
                ("key", key.to_string()),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|err| ImageError::UploadNetworkError(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ImageError::UploadNetworkError(err.to_string()))?;
        parse_upload_response(status, &body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    data: Option<UploadedImage>,
    #[serde(default)]
    error: Option<UploadFailure>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadFailure {
    #[serde(default)]
    message: Option<String>,
}

fn parse_upload_response(status: StatusCode, body: &str) -> Result<String, ImageError> {
    let parsed: UploadResponse = serde_json::from_str(body).unwrap_or_default();

    if !status.is_success() {
        let message = parsed
            .error
            .and_then(|error| error.message)
            .unwrap_or_else(|| format!("host answered {status}"));
        return Err(ImageError::UploadNetworkError(message));
    }

    parsed
        .data
        .map(|data| data.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ImageError::UploadNetworkError("response carried no image URL".into()))
}

/// Fetches remote images over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageFile, ImageError> {
        let blocked = |err: reqwest::Error| ImageError::FetchCorsBlocked(format!("{url}: {err}"));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(blocked)?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|mime| !mime.is_empty());
        let bytes = response.bytes().await.map_err(blocked)?;

        let name = file_name_from_url(url);
        let mime = content_type.unwrap_or_else(|| {
            mime_guess::from_path(&name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });
        Ok(ImageFile::new(name, mime, bytes.to_vec()))
    }
}

fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()?
                .last()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| PASTED_IMAGE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_upload_yields_hosted_url() {
        let body = r#"{"data":{"url":"https://i.ibb.co/x/a.png"},"success":true,"status":200}"#;
        assert_eq!(
            parse_upload_response(StatusCode::OK, body),
            Ok("https://i.ibb.co/x/a.png".to_string())
        );
    }

    #[test]
    fn rejected_upload_reports_host_message() {
        let body = r#"{"status_code":400,"error":{"message":"Invalid API v1 key.","code":100}}"#;
        assert_eq!(
            parse_upload_response(StatusCode::BAD_REQUEST, body),
            Err(ImageError::UploadNetworkError("Invalid API v1 key.".into()))
        );

        let err = parse_upload_response(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, ImageError::UploadNetworkError(msg) if msg.contains("502")));
    }

    #[test]
    fn file_name_comes_from_last_path_segment() {
        assert_eq!(file_name_from_url("https://a.test/img/cat.jpg?x=1"), "cat.jpg");
        assert_eq!(file_name_from_url("https://a.test/"), PASTED_IMAGE_NAME);
    }
}
