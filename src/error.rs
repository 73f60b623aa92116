//! Error types for deptrust.
//!
//! Each pipeline concern gets its own `thiserror` enum; [`DeptrustError`]
//! composes them with `#[from]` so `?` works across module boundaries. Use
//! [`DeptrustError::suggestion`] to surface an actionable next step in the
//! CLI and [`DeptrustError::display_formatted`] for colored terminal output.

use colored::Colorize;
use thiserror::Error;

/// Errors raised while selecting or running manifest scanners.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no scanner produced any dependencies under {path}")]
    ManifestNotFound { path: String },

    #[error("unknown manager(s): {0:?}")]
    UnknownManagers(Vec<String>),

    #[error("failed to read manifest {path}: {source}")]
    ManifestReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {reason}")]
    ManifestParseError { path: String, reason: String },
}

/// Errors raised by the advisory aggregator.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("advisory service request failed: {0}")]
    ServiceError(String),

    #[error("invalid GitHub token")]
    InvalidToken,

    #[error("advisory batch request exhausted retries: {0}")]
    RetriesExhausted(String),
}

/// Errors raised by the metadata resolver's registry adapters.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("registry request failed for {ecosystem}:{name}: {reason}")]
    RequestFailed {
        ecosystem: String,
        name: String,
        reason: String,
    },

    #[error("registry response could not be parsed for {ecosystem}:{name}: {reason}")]
    ParseFailed {
        ecosystem: String,
        name: String,
        reason: String,
    },
}

/// Errors raised by the trust policy engine.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("failed to load compromise index from {path}: {reason}")]
    CompromiseIndexLoadError { path: String, reason: String },

    #[error("failed to load top-package list from {path}: {reason}")]
    TopPackagesLoadError { path: String, reason: String },
}

/// Errors raised while building a CycloneDX SBOM.
#[derive(Error, Debug)]
pub enum SbomError {
    #[error("cannot build a purl for maven dependency without a group:artifact name: {0}")]
    InvalidMavenCoordinate(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidEnvVar {
        var: String,
        value: String,
        reason: String,
    },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised by the metadata disk cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to resolve cache directory")]
    DirectoryResolutionFailed,

    #[error("failed to read cache entry {key}: {source}")]
    ReadError {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache entry {key}: {source}")]
    WriteError {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache entry {key}: {source}")]
    SerializeError {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the CLI's output renderers (external collaborators).
#[derive(Error, Debug)]
pub enum ReportRenderingError {
    #[error("unsupported output format {format:?} for this command")]
    UnsupportedFormat { format: String },

    #[error("failed to write report to {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report rendering failed: {0}")]
    TemplateError(String),
}

/// The crate's top-level error type.
#[derive(Error, Debug)]
pub enum DeptrustError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Sbom(#[from] SbomError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Rendering(#[from] ReportRenderingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeptrustError {
    /// A short, actionable suggestion shown alongside the error in the CLI.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            DeptrustError::Scan(ScanError::ManifestNotFound { .. }) => {
                Some("check that the directory contains a supported manifest file")
            }
            DeptrustError::Scan(ScanError::UnknownManagers(_)) => {
                Some("run `deptrust list-managers` to see supported manager names")
            }
            DeptrustError::Advisory(AdvisoryError::InvalidToken) => {
                Some("set DEPTRUST_GITHUB_TOKEN or GITHUB_TOKEN to a valid token, or disable GitHub advisories")
            }
            DeptrustError::Advisory(AdvisoryError::RetriesExhausted(_)) => {
                Some("the vulnerability service may be degraded; retry later or increase DEPTRUST_HTTP_RETRIES")
            }
            DeptrustError::Config(ConfigError::InvalidEnvVar { .. }) => {
                Some("check the value of the referenced environment variable")
            }
            DeptrustError::Rendering(ReportRenderingError::UnsupportedFormat { .. }) => {
                Some("use one of: table, json, html")
            }
            _ => None,
        }
    }

    /// Render the error (and suggestion, if any) for terminal output.
    pub fn display_formatted(&self) -> String {
        let mut out = format!("{} {}", "error:".red().bold(), self);
        if let Some(suggestion) = self.suggestion() {
            out.push_str(&format!("\n  {} {}", "help:".cyan().bold(), suggestion));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_message() {
        let err = ScanError::ManifestNotFound {
            path: "/tmp/project".into(),
        };
        assert!(err.to_string().contains("/tmp/project"));
    }

    #[test]
    fn unknown_managers_lists_offenders() {
        let err = ScanError::UnknownManagers(vec!["npmx".into(), "foo".into()]);
        let message = err.to_string();
        assert!(message.contains("npmx"));
        assert!(message.contains("foo"));
    }

    #[test]
    fn invalid_token_suggestion() {
        let err = DeptrustError::Advisory(AdvisoryError::InvalidToken);
        assert!(err.suggestion().unwrap().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn manifest_not_found_suggestion() {
        let err = DeptrustError::Scan(ScanError::ManifestNotFound { path: ".".into() });
        assert!(err.suggestion().unwrap().contains("manifest"));
    }

    #[test]
    fn unsupported_format_suggestion() {
        let err = DeptrustError::Rendering(ReportRenderingError::UnsupportedFormat {
            format: "yaml".into(),
        });
        assert!(err.suggestion().unwrap().contains("table"));
    }

    #[test]
    fn io_error_has_no_suggestion() {
        let err = DeptrustError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn display_formatted_includes_suggestion_when_present() {
        let err = DeptrustError::Advisory(AdvisoryError::InvalidToken);
        let formatted = err.display_formatted();
        assert!(formatted.contains("help:"));
    }

    #[test]
    fn config_invalid_env_var_message() {
        let err = ConfigError::InvalidEnvVar {
            var: "DEPTRUST_HTTP_TIMEOUT".into(),
            value: "abc".into(),
            reason: "not a float".into(),
        };
        let message = err.to_string();
        assert!(message.contains("DEPTRUST_HTTP_TIMEOUT"));
        assert!(message.contains("abc"));
    }
}
