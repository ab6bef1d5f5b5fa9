//! Provider credentials and model choices, read once from the environment.

use std::fmt;
use std::time::Duration;

use medchat_rag::gemini::{DEFAULT_CHAT_MODEL, DEFAULT_TEMPERATURE};
use medchat_rag::openai::DEFAULT_EMBEDDING_MODEL;
use medchat_rag::{RagError, Result};

/// Default per-request timeout for both providers.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Everything needed to construct the embedding and chat providers.
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    pub openai_api_key: String,
    pub google_api_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("openai_api_key", &"<redacted>")
            .field("google_api_key", &"<redacted>")
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// [`RagError::MissingConfiguration`] naming every absent key at once,
    /// or [`RagError::InvalidConfiguration`] for an unparseable number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = get("OPENAI_API_KEY");
        let google_api_key = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));

        let mut missing = Vec::new();
        if openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if google_api_key.is_none() {
            missing.push("GOOGLE_API_KEY (or GEMINI_API_KEY)");
        }
        let (Some(openai_api_key), Some(google_api_key)) = (openai_api_key, google_api_key) else {
            return Err(RagError::MissingConfiguration(format!(
                "set {} in the environment or a .env file",
                missing.join(", ")
            )));
        };

        let temperature = match get("MEDCHAT_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or_else(|| {
                    RagError::InvalidConfiguration(format!(
                        "MEDCHAT_TEMPERATURE must be a number between 0 and 2, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_TEMPERATURE,
        };
        let timeout_secs = match get("MEDCHAT_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                RagError::InvalidConfiguration(format!(
                    "MEDCHAT_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            openai_api_key,
            google_api_key,
            embedding_model: get("MEDCHAT_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            chat_model: get("MEDCHAT_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            temperature,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_API_KEY", "g-test"),
        ]))
        .unwrap();
        assert_eq!(settings.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.chat_model, "gemini-2.0-flash");
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn gemini_alias_and_overrides() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GEMINI_API_KEY", "g-alias"),
            ("MEDCHAT_CHAT_MODEL", "gemini-2.5-flash"),
            ("MEDCHAT_TEMPERATURE", "0.2"),
            ("MEDCHAT_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(settings.google_api_key, "g-alias");
        assert_eq!(settings.chat_model, "gemini-2.5-flash");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.timeout, Duration::from_secs(15));
    }

    #[test]
    fn reports_all_missing_keys() {
        let err = ProviderSettings::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        let RagError::MissingConfiguration(message) = err else {
            panic!("expected MissingConfiguration, got {err:?}");
        };
        assert!(message.contains("OPENAI_API_KEY"));
        assert!(message.contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn rejects_bad_numbers() {
        let base = [("OPENAI_API_KEY", "sk"), ("GOOGLE_API_KEY", "g")];
        for (key, value) in [("MEDCHAT_TEMPERATURE", "hot"), ("MEDCHAT_TIMEOUT_SECS", "0")] {
            let mut vars = base.to_vec();
            vars.push((key, value));
            let err = ProviderSettings::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, RagError::InvalidConfiguration(_)), "{key}");
        }
    }

    #[test]
    fn debug_redacts_keys() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-secret"),
            ("GOOGLE_API_KEY", "g-secret"),
        ]))
        .unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"));
    }
}
