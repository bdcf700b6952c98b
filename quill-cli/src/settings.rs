//! Environment-driven application settings.

use clap::Parser;

/// Streaming chat for the hosted model API, with optional per-session
/// document retrieval.
#[derive(Debug, Parser)]
#[command(name = "quill", version, about)]
pub struct Settings {
    /// API key for the hosted endpoint (must start with `nvapi-`).
    #[arg(long, env = "NVIDIA_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Chat completions base URL.
    #[arg(long, env = "NVIDIA_BASE_URL", default_value = quill_model::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model identifier.
    #[arg(long, env = "QUILL_MODEL", default_value = quill_model::DEFAULT_MODEL)]
    pub model: String,

    /// Maximum tokens to generate.
    #[arg(long, env = "QUILL_MAX_TOKENS", default_value_t = quill_model::DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, env = "QUILL_TEMPERATURE", default_value_t = quill_model::DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Nucleus sampling parameter.
    #[arg(long, env = "QUILL_TOP_P", default_value_t = quill_model::DEFAULT_TOP_P)]
    pub top_p: f32,

    /// Disable the model's thinking mode.
    #[arg(long, env = "QUILL_NO_THINKING")]
    pub no_thinking: bool,

    /// Request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout: u64,

    /// Chunk size in characters for document ingestion.
    #[arg(long, env = "QUILL_CHUNK_SIZE", default_value_t = 512)]
    pub chunk_size: usize,

    /// Overlap in characters between consecutive chunks.
    #[arg(long, env = "QUILL_CHUNK_OVERLAP", default_value_t = 50)]
    pub chunk_overlap: usize,

    /// Retrieved chunks injected per turn.
    #[arg(long, env = "QUILL_TOP_K", default_value_t = 3)]
    pub top_k: usize,
}

impl Settings {
    /// Validate ranges the API and the chunker will reject later anyway,
    /// so misconfiguration fails at startup with a clear message.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err(
                "API key is not configured; set the NVIDIA_API_KEY environment variable".into()
            );
        }
        if !self.api_key.starts_with("nvapi-") {
            return Err("API key should start with 'nvapi-'".into());
        }
        if self.max_tokens == 0 || self.max_tokens > 131_072 {
            return Err(format!("max_tokens must be in 1..=131072, got {}", self.max_tokens));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature must be in 0.0..=2.0, got {}", self.temperature));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!("top_p must be in 0.0..=1.0, got {}", self.top_p));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.top_k == 0 {
            return Err("top_k must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::parse_from(["quill", "--api-key", "nvapi-abc123"])
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn rejects_bad_api_key() {
        let mut s = settings();
        s.api_key = "sk-wrong-prefix".to_string();
        assert!(s.validate().unwrap_err().contains("nvapi-"));
        s.api_key = "  ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_sampling() {
        let mut s = settings();
        s.temperature = 2.5;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.top_p = 1.5;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.max_tokens = 200_000;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_invalid_chunking() {
        let mut s = settings();
        s.chunk_overlap = s.chunk_size;
        assert!(s.validate().is_err());
    }
}
