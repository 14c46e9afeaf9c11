//! adaptest configuration and provider factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::bank::parse_bank;
use adaptest_core::traits::AlternativePathProvider;
use adaptest_core::QuestionBank;

use crate::bank::BankAlternativeProvider;
use crate::http::{HttpBackend, DEFAULT_TIMEOUT_SECS};

/// Environment variable that switches alternatives to an HTTP backend.
pub const BACKEND_URL_ENV: &str = "ADAPTEST_BACKEND_URL";

/// Where diagnostic-tree alternatives come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlternativesConfig {
    /// A remote diagnostic backend.
    Http { base_url: String },
    /// Replay the selector against the local bank.
    #[default]
    Bank,
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Question bank file; the builtin bank is used when unset.
    #[serde(default)]
    pub bank: Option<PathBuf>,
    /// Directory for saved results.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Per-request timeout for alternative providers.
    #[serde(default = "default_timeout")]
    pub provider_timeout_secs: u64,
    #[serde(default)]
    pub alternatives: AlternativesConfig,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./adaptest-results")
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            bank: None,
            results_dir: default_results_dir(),
            provider_timeout_secs: default_timeout(),
            alternatives: AlternativesConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_config(config: &mut AdaptestConfig) {
    if let AlternativesConfig::Http { base_url } = &mut config.alternatives {
        *base_url = resolve_env_vars(base_url);
    }
    if let Some(bank) = &config.bank {
        config.bank = Some(PathBuf::from(resolve_env_vars(&bank.to_string_lossy())));
    }
}

/// Point alternatives at `backend_url` when it is set and non-empty.
fn apply_backend_override(config: &mut AdaptestConfig, backend_url: Option<String>) {
    if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
        config.alternatives = AlternativesConfig::Http { base_url: url };
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// `ADAPTEST_BACKEND_URL` overrides the alternatives provider.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("adaptest.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<AdaptestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => AdaptestConfig::default(),
    };

    apply_backend_override(&mut config, std::env::var(BACKEND_URL_ENV).ok());
    resolve_config(&mut config);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

/// Load the configured question bank, or the builtin one.
pub fn load_bank(config: &AdaptestConfig) -> Result<QuestionBank> {
    match &config.bank {
        Some(path) => parse_bank(path),
        None => Ok(QuestionBank::builtin()),
    }
}

/// Create the alternative-path provider described by `config`.
pub fn create_provider(
    config: &AdaptestConfig,
    bank: Arc<QuestionBank>,
) -> Result<Arc<dyn AlternativePathProvider>> {
    match &config.alternatives {
        AlternativesConfig::Http { base_url } => {
            let backend = HttpBackend::new(base_url, config.provider_timeout_secs)
                .context("invalid [alternatives] http configuration")?;
            Ok(Arc::new(backend))
        }
        AlternativesConfig::Bank => Ok(Arc::new(BankAlternativeProvider::new(bank))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_ADAPTEST_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_ADAPTEST_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("http://${_ADAPTEST_TEST_VAR}/api"),
            "http://hello/api"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_ADAPTEST_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_rescan_values() {
        std::env::set_var("_ADAPTEST_TEST_SELF", "x${_ADAPTEST_TEST_SELF}");
        assert_eq!(
            resolve_env_vars("${_ADAPTEST_TEST_SELF}/${_ADAPTEST_TEST_SELF}"),
            "x${_ADAPTEST_TEST_SELF}/x${_ADAPTEST_TEST_SELF}"
        );
        std::env::remove_var("_ADAPTEST_TEST_SELF");
    }

    #[test]
    fn default_config() {
        let config = AdaptestConfig::default();
        assert_eq!(config.bank, None);
        assert_eq!(config.provider_timeout_secs, 10);
        assert_eq!(config.alternatives, AlternativesConfig::Bank);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
bank = "questions.toml"
results_dir = "out"
provider_timeout_secs = 3

[alternatives]
type = "http"
base_url = "http://localhost:8000/api/diagnostic"
"#;
        let config: AdaptestConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bank, Some(PathBuf::from("questions.toml")));
        assert_eq!(config.results_dir, PathBuf::from("out"));
        assert_eq!(
            config.alternatives,
            AlternativesConfig::Http {
                base_url: "http://localhost:8000/api/diagnostic".into()
            }
        );
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn loads_explicit_file_and_resolves_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptest.toml");
        std::env::set_var("_ADAPTEST_TEST_HOST", "backend.local");
        std::fs::write(
            &path,
            "[alternatives]\ntype = \"http\"\nbase_url = \"http://${_ADAPTEST_TEST_HOST}/api\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        std::env::remove_var("_ADAPTEST_TEST_HOST");

        assert_eq!(
            config.alternatives,
            AlternativesConfig::Http {
                base_url: "http://backend.local/api".into()
            }
        );
    }

    #[test]
    fn backend_override_switches_to_http() {
        let mut config = AdaptestConfig::default();
        apply_backend_override(&mut config, Some("   ".into()));
        assert_eq!(config.alternatives, AlternativesConfig::Bank);

        apply_backend_override(&mut config, Some("http://remote".into()));
        assert_eq!(
            config.alternatives,
            AlternativesConfig::Http {
                base_url: "http://remote".into()
            }
        );
    }

    #[test]
    fn factory_builds_each_kind() {
        let bank = Arc::new(QuestionBank::builtin());
        let provider = create_provider(&AdaptestConfig::default(), bank.clone()).unwrap();
        assert_eq!(provider.name(), "bank");

        let config = AdaptestConfig {
            alternatives: AlternativesConfig::Http {
                base_url: "http://localhost:9".into(),
            },
            ..AdaptestConfig::default()
        };
        assert_eq!(create_provider(&config, bank.clone()).unwrap().name(), "http");

        let empty = AdaptestConfig {
            alternatives: AlternativesConfig::Http {
                base_url: String::new(),
            },
            ..AdaptestConfig::default()
        };
        assert!(create_provider(&empty, bank).is_err());
    }

    #[test]
    fn bank_defaults_to_builtin() {
        let bank = load_bank(&AdaptestConfig::default()).unwrap();
        assert_eq!(bank.len(), 6);

        let missing = AdaptestConfig {
            bank: Some(PathBuf::from("/no/such/bank.toml")),
            ..AdaptestConfig::default()
        };
        assert!(load_bank(&missing).is_err());
    }
}
