use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Backend AI service. The set is closed and compiled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    #[default]
    GoogleAiStudio,
    VertexAi,
    /// Any Gemini-compatible endpoint authenticated with a bearer token.
    Generic,
}

/// Static per-provider wire conventions.
#[derive(Debug, PartialEq, Eq)]
pub struct ProviderProfile {
    pub header_name: &'static str,
    /// Prepended to the credential in the auth header value (empty = raw key).
    pub header_value_prefix: &'static str,
    pub streaming_url_suffix: &'static str,
    pub non_streaming_url_suffix: &'static str,
    /// Attach the block that disables every content-category filter.
    pub supports_safety_block: bool,
    /// Attach the thinking generation option when the caller asks for it.
    pub supports_thinking_block: bool,
    /// Environment variable the credential is read from unless configured otherwise.
    pub default_api_key_env: &'static str,
}

static GOOGLE_AI_STUDIO: ProviderProfile = ProviderProfile {
    header_name: "X-goog-api-key",
    header_value_prefix: "",
    streaming_url_suffix: ":streamGenerateContent",
    non_streaming_url_suffix: ":generateContent",
    supports_safety_block: true,
    supports_thinking_block: true,
    default_api_key_env: "GEMINI_API_KEY",
};

static VERTEX_AI: ProviderProfile = ProviderProfile {
    header_name: "Authorization",
    header_value_prefix: "Bearer ",
    streaming_url_suffix: ":streamGenerateContent",
    non_streaming_url_suffix: ":generateContent",
    supports_safety_block: true,
    supports_thinking_block: true,
    default_api_key_env: "VERTEX_ACCESS_TOKEN",
};

static GENERIC: ProviderProfile = ProviderProfile {
    header_name: "Authorization",
    header_value_prefix: "Bearer ",
    streaming_url_suffix: ":streamGenerateContent",
    non_streaming_url_suffix: ":generateContent",
    supports_safety_block: false,
    supports_thinking_block: false,
    default_api_key_env: "PARLEY_API_KEY",
};

impl Provider {
    pub fn profile(self) -> &'static ProviderProfile {
        match self {
            Self::GoogleAiStudio => &GOOGLE_AI_STUDIO,
            Self::VertexAi => &VERTEX_AI,
            Self::Generic => &GENERIC,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleAiStudio => "google-ai-studio",
            Self::VertexAi => "vertex-ai",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google-ai-studio" | "gemini" | "aistudio" => Ok(Self::GoogleAiStudio),
            "vertex-ai" | "vertex" => Ok(Self::VertexAi),
            "generic" => Ok(Self::Generic),
            other => Err(format!(
                "unknown provider '{other}' (expected google-ai-studio, vertex-ai or generic)"
            )),
        }
    }
}

impl ProviderProfile {
    /// `{endpoint_base}{suffix}` for the chosen mode.
    pub fn url(&self, endpoint_base: &str, streaming: bool) -> String {
        let suffix = if streaming {
            self.streaming_url_suffix
        } else {
            self.non_streaming_url_suffix
        };
        format!("{}{suffix}", endpoint_base.trim_end_matches('/'))
    }

    pub fn auth_header_value(&self, api_key: &str) -> String {
        format!("{}{api_key}", self.header_value_prefix)
    }
}
