use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by the outline engine's fallible edges (symbol fetching, config loading).
pub enum OutlineError {
    #[error("no symbols available for '{document}' after {attempts} attempts")]
    /// The symbol provider kept returning an empty list (only raised in debug mode).
    SymbolsUnavailable {
        /// URI of the document that produced no symbols.
        document: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    #[error("symbol provider error: {0}")]
    /// The symbol provider failed.
    Provider(String),

    #[error("invalid configuration: {0}")]
    /// A configuration value failed validation.
    InvalidConfig(String),

    #[error("JSON parse error: {0}")]
    /// JSON parsing failed.
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),
}
