//! Runtime configuration.
//!
//! Values layer in the usual order: built-in defaults, then an optional
//! `reviewd.toml` next to the working directory, then `REVIEWD_`-prefixed
//! environment variables, with command-line flags applied on top by the
//! binary.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Runtime configuration shared by the server and admin subcommands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server bind address.
    pub bind: String,
    /// Database connection string or path.
    pub database: String,
    /// Server secret used for token signing and confirmation codes.
    ///
    /// When unset a random per-process secret is generated, which
    /// invalidates all outstanding tokens and codes on restart.
    pub secret_key: Option<String>,
    /// Access-token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Confirmation-code validity window in seconds.
    pub code_ttl_secs: i64,
    /// Sender address on confirmation mail.
    pub from_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_owned(),
            database: "reviewd.db".to_owned(),
            secret_key: None,
            token_ttl_secs: 86_400,
            code_ttl_secs: 259_200,
            from_address: "reviewd@example.com".to_owned(),
        }
    }
}

impl AppConfig {
    /// The provider stack without extraction, for callers that want to
    /// merge further layers.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("reviewd.toml"))
            .merge(Env::prefixed("REVIEWD_"))
    }

    /// Load configuration from defaults, file, and environment.
    ///
    /// # Errors
    /// Returns any extraction error, such as a malformed TOML file or an
    /// unparseable numeric variable.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
