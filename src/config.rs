use anyhow::{bail, Context};

use crate::models::ModelOption;

const DEFAULT_PORT: u16 = 3000;

/// Models offered to the client when `FINCHART_MODELS` is unset.
const DEFAULT_MODELS: [(&str, &str); 2] = [
    ("claude-3-haiku-20240307", "Claude 3 Haiku"),
    ("claude-3-5-sonnet-20240620", "Claude 3.5 Sonnet"),
];
const DEFAULT_MODEL_ID: &str = "claude-3-5-sonnet-20240620";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub port: u16,
    pub models: Vec<ModelOption>,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY must be set (copy .env.example to .env)")?;

        let port = match var("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT '{p}' is not a valid port"))?,
            None => DEFAULT_PORT,
        };

        let mut models = match var("FINCHART_MODELS") {
            Some(list) => parse_models(&list)?,
            None => DEFAULT_MODELS
                .iter()
                .map(|(id, name)| ModelOption {
                    id: id.to_string(),
                    name: name.to_string(),
                    default: false,
                })
                .collect(),
        };

        let default_id = match var("FINCHART_DEFAULT_MODEL") {
            Some(id) if models.iter().any(|m| m.id == id) => id,
            Some(id) => bail!("FINCHART_DEFAULT_MODEL '{id}' is not in the model list"),
            None if models.iter().any(|m| m.id == DEFAULT_MODEL_ID) => DEFAULT_MODEL_ID.to_string(),
            None => models[0].id.clone(),
        };
        for model in &mut models {
            model.default = model.id == default_id;
        }

        Ok(Self {
            api_key,
            base_url: var("ANTHROPIC_BASE_URL"),
            port,
            models,
        })
    }

    pub fn default_model(&self) -> Option<&ModelOption> {
        self.models.iter().find(|m| m.default)
    }
}

/// Parses `id=Display Name` pairs separated by commas. A bare id is its own
/// display name.
fn parse_models(list: &str) -> anyhow::Result<Vec<ModelOption>> {
    let models: Vec<ModelOption> = list
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = entry.split_once('=').unwrap_or((entry, entry));
            ModelOption {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
                default: false,
            }
        })
        .collect();

    if models.is_empty() || models.iter().any(|m| m.id.is_empty()) {
        bail!("FINCHART_MODELS must be a comma-separated list of id=Name entries");
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let cfg = config(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.base_url, None);
        assert_eq!(cfg.models.len(), 2);
        assert_eq!(cfg.default_model().unwrap().id, "claude-3-5-sonnet-20240620");
    }

    #[test]
    fn missing_api_key_is_an_error() {
        assert!(config(&[]).is_err());
        assert!(config(&[("ANTHROPIC_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn custom_model_list_and_default() {
        let cfg = config(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("FINCHART_MODELS", "m-small=Small, m-large"),
            ("FINCHART_DEFAULT_MODEL", "m-large"),
            ("PORT", "8081"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.models[0].name, "Small");
        assert_eq!(cfg.models[1].name, "m-large");
        assert_eq!(cfg.default_model().unwrap().id, "m-large");

        let first_wins = config(&[("ANTHROPIC_API_KEY", "k"), ("FINCHART_MODELS", "a,b")]).unwrap();
        assert_eq!(first_wins.default_model().unwrap().id, "a");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(config(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "eighty")]).is_err());
        assert!(config(&[("ANTHROPIC_API_KEY", "k"), ("FINCHART_MODELS", "=Nameless")]).is_err());
        assert!(config(&[("ANTHROPIC_API_KEY", "k"), ("FINCHART_DEFAULT_MODEL", "gpt")]).is_err());
    }
}
