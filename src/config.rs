use crate::models::GenerationMode;
use std::env;

/// Upload ceiling applied to every selected file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub max_file_bytes: u64,
    pub initial_mode: GenerationMode,
    pub initial_prompt: String,
    pub backend: Option<BackendConfig>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            endpoint: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let endpoint = env::var("PRODGEN_BACKEND_URL").ok();
        let api_key = env::var("PRODGEN_API_KEY").ok();
        let timeout_secs = env::var("PRODGEN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        BackendConfig {
            endpoint,
            api_key,
            timeout_secs,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            initial_mode: GenerationMode::Image,
            initial_prompt: String::new(),
            backend: None,
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `PRODGEN_*` variables; anything missing or unparsable keeps its default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_file_bytes = env::var("PRODGEN_MAX_UPLOAD_MB")
            .ok()
            .and_then(|mb| mb.parse::<u64>().ok())
            .and_then(megabytes_to_bytes)
            .unwrap_or(defaults.max_file_bytes);
        let initial_mode = env::var("PRODGEN_INITIAL_MODE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(defaults.initial_mode);
        let initial_prompt = env::var("PRODGEN_INITIAL_PROMPT").unwrap_or_default();

        StudioConfig {
            max_file_bytes,
            initial_mode,
            initial_prompt,
            backend: Some(BackendConfig::from_env()),
        }
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn with_initial_mode(mut self, mode: GenerationMode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = prompt.into();
        self
    }

    pub fn with_backend(mut self, config: BackendConfig) -> Self {
        self.backend = Some(config);
        self
    }
}

/// `None` when the byte count does not fit in a `u64`.
fn megabytes_to_bytes(mb: u64) -> Option<u64> {
    mb.checked_mul(1024 * 1024)
}
