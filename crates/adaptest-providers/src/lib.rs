//! adaptest-providers — backend collaborators for the evaluation engine.
//!
//! Implements `AlternativePathProvider` and `QuestionRepository` over HTTP,
//! an offline bank-backed alternative provider, a mock for tests, and the
//! configuration layer that picks between them.

pub mod bank;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use bank::BankAlternativeProvider;
pub use config::{create_provider, load_bank, load_config, load_config_from, AdaptestConfig, AlternativesConfig};
pub use error::ProviderError;
pub use http::HttpBackend;
pub use mock::MockAlternativeProvider;
