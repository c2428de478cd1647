use std::path::PathBuf;
use thiserror::Error;

use super::ValidationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown domain '{domain}'. Known domains: {known}.")]
    UnknownDomain { domain: String, known: String },
    #[error("Unknown format '{format}' for domain '{domain}'. Known formats: {known}.")]
    UnknownFormat {
        domain: String,
        format: String,
        known: String,
    },
    #[error("Run would issue {requested} requests; the limit is {max}. Narrow --widths or the selectors.")]
    TooManyRequests { requested: u64, max: u64 },
    #[error("Unknown format '{format}'. No domain serves it.")]
    FormatNotServed { format: String },
    #[error("Template set is empty.")]
    NoTemplates,
    #[error("Invalid template for {domain}/{format} '{base}': {source}")]
    InvalidTemplate {
        domain: String,
        format: String,
        base: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Template for {domain}/{format} must use http or https, got '{scheme}'.")]
    UnsupportedScheme {
        domain: String,
        format: String,
        scheme: String,
    },
    #[error("Invalid width range: {source}")]
    InvalidWidths {
        #[source]
        source: ValidationError,
    },
    #[error("Config '{field}' must be >= 1: {source}")]
    FieldMustBePositive {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Invalid '{field}' value: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
