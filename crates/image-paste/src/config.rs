pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";
pub const DEFAULT_EXPIRATION_SECS: u64 = 600;
pub const DEFAULT_TRUSTED_HOST: &str = "imgbb.com";

/// Hosts whose images count as already hosted regardless of configuration.
/// ImgBB serves uploads from `i.ibb.co`.
const ALWAYS_TRUSTED_HOSTS: &[&str] = &["ibb.co", "imgur.com"];

const API_KEY_VARS: &[&str] = &["IMGBB_API_KEY", "VITE_IMGBB_API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub expiration_secs: u64,
    pub trusted_host: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            trusted_host: DEFAULT_TRUSTED_HOST.to_string(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the API key through `lookup`, first non-empty variable wins.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find_map(|raw| sanitize_api_key(&raw));
        if api_key.is_none() {
            log::debug!("no image host API key configured");
        }

        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl AsRef<str>) -> Self {
        self.api_key = sanitize_api_key(key.as_ref());
        self
    }

    /// Whether `host` belongs to the configured host or an always-trusted one.
    pub fn is_trusted_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        std::iter::once(self.trusted_host.as_str())
            .chain(ALWAYS_TRUSTED_HOSTS.iter().copied())
            .any(|trusted| host == trusted || host.ends_with(&format!(".{trusted}")))
    }
}

/// Drops quotes and whitespace pasted along with the key.
pub fn sanitize_api_key(raw: &str) -> Option<String> {
    let key: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"' && *c != '\'')
        .collect();
    (!key.is_empty()).then_some(key)
}
