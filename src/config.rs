use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::attachment::MAX_ATTACHMENT_BYTES;
use crate::error::ParleyError;
use crate::history::Turn;
use crate::provider::Provider;
use crate::request::GenerationRequest;

/// Config file read when `PARLEY_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "parley.toml";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
const AI_STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationSettings,
    pub http: HttpSettings,
    pub attachments: AttachmentSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: Provider,
    pub model: String,
    /// Full model URL without the method suffix. Derived from the provider when unset.
    pub endpoint_base: Option<String>,
    pub streaming: bool,
    pub thinking: bool,
    /// Environment variable holding the already-resolved credential.
    pub api_key_env: Option<String>,
    pub vertex_project: Option<String>,
    pub vertex_location: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: DEFAULT_MODEL.to_string(),
            endpoint_base: None,
            streaming: true,
            thinking: false,
            api_key_env: None,
            vertex_project: None,
            vertex_location: DEFAULT_VERTEX_LOCATION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttachmentSettings {
    pub max_bytes: u64,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

impl Config {
    /// Load from `$PARLEY_CONFIG`, else `parley.toml` in the working directory.
    ///
    /// A missing default file yields defaults; a missing file named by
    /// `PARLEY_CONFIG` is an error.
    pub fn load() -> Result<Self, ParleyError> {
        match env::var_os("PARLEY_CONFIG") {
            Some(path) => Self::from_file(&PathBuf::from(path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ParleyError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| ParleyError::Config(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), provider = %config.generation.provider, "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ParleyError> {
        toml::from_str(text).map_err(|e| ParleyError::Config(e.to_string()))
    }

    /// Endpoint base URL: the configured one, or the provider's default for `model`.
    pub fn endpoint_base(&self) -> Result<String, ParleyError> {
        let g = &self.generation;
        if let Some(base) = g.endpoint_base.as_ref().filter(|b| !b.trim().is_empty()) {
            return Ok(base.trim().trim_end_matches('/').to_string());
        }

        match g.provider {
            Provider::GoogleAiStudio => Ok(format!("{AI_STUDIO_BASE_URL}/models/{}", g.model)),
            Provider::VertexAi => {
                let project = g.vertex_project.as_deref().ok_or_else(|| {
                    ParleyError::Config(
                        "vertex-ai needs generation.vertex_project or generation.endpoint_base"
                            .to_string(),
                    )
                })?;
                let location = &g.vertex_location;
                Ok(format!(
                    "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{}",
                    g.model
                ))
            }
            Provider::Generic => Err(ParleyError::Config(
                "generic provider needs generation.endpoint_base".to_string(),
            )),
        }
    }

    /// Name of the environment variable the credential is read from.
    pub fn api_key_env(&self) -> &str {
        self.generation
            .api_key_env
            .as_deref()
            .unwrap_or(self.generation.provider.profile().default_api_key_env)
    }

    /// Read the already-resolved credential from the environment.
    pub fn api_key(&self) -> Result<String, ParleyError> {
        let var = self.api_key_env();
        env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ParleyError::Config(format!("{var} is not set")))
    }

    /// Assemble a request for `history` from the configured settings.
    pub fn request(&self, history: Vec<Turn>, api_key: String) -> Result<GenerationRequest, ParleyError> {
        Ok(GenerationRequest {
            history,
            endpoint_base: self.endpoint_base()?,
            provider: self.generation.provider,
            thinking_enabled: self.generation.thinking,
            streaming: self.generation.streaming,
            api_key,
        })
    }
}
