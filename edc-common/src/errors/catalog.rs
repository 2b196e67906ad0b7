//! Error catalog for edcctl.
//!
//! Every failure the CLI reports maps to one [`ErrorCode`] with:
//! - A stable code (EDC-E001 through EDC-E599)
//! - A human-readable message
//! - Remediation steps
//! - The process exit code it terminates with
//!
//! # Error Code Ranges
//!
//! | Range      | Category      | Description                                |
//! |------------|---------------|--------------------------------------------|
//! | E001-E099  | Config        | `.env`, stack TOML and setting errors      |
//! | E100-E199  | Prerequisite  | Missing binaries and cluster connectivity  |
//! | E200-E299  | Deploy        | helm/kubectl steps, releases, backups      |
//! | E300-E399  | Api           | EDC Management API responses and polling   |
//! | E400-E499  | Usage         | Bad arguments, cancellation, interruption  |
//! | E500-E599  | Internal      | I/O and serialization failures             |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all edcctl failure scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// `.env` file does not exist
    ConfigEnvFileNotFound,
    /// `.env` file contains a line that cannot be parsed
    ConfigEnvFileMalformed,
    /// A mandatory key is unset or empty
    ConfigMissingKey,
    /// A key has a value of the wrong shape
    ConfigInvalidValue,
    /// Stack configuration file does not exist
    ConfigStackNotFound,
    /// Stack configuration is not valid TOML
    ConfigStackParseError,
    /// Stack configuration parsed but is inconsistent
    ConfigStackInvalid,

    // =========================================================================
    // Prerequisite Errors (E100-E199)
    // =========================================================================
    /// Required binary not found on PATH
    PrereqBinaryMissing,
    /// Kubernetes cluster not reachable
    PrereqClusterUnreachable,
    /// cert-manager CRDs not installed (advisory)
    PrereqCertManagerMissing,

    // =========================================================================
    // Deploy Errors (E200-E299)
    // =========================================================================
    /// A helm or kubectl step exited non-zero
    DeployStepFailed,
    /// The release does not exist
    DeployReleaseNotFound,
    /// The release already exists
    DeployReleaseExists,
    /// Writing the pre-change backup failed
    DeployBackupFailed,
    /// helm or kubectl could not be started
    DeployCommandSpawn,

    // =========================================================================
    // Api Errors (E300-E399)
    // =========================================================================
    /// Management API answered with an unexpected status
    ApiUnexpectedStatus,
    /// HTTP request could not be completed
    ApiRequestFailed,
    /// Response body is not the expected JSON
    ApiMalformedResponse,
    /// Response lacks a required field or the field is empty
    ApiMissingField,
    /// Negotiation did not complete within the polling budget
    ApiPollTimeout,

    // =========================================================================
    // Usage Errors (E400-E499)
    // =========================================================================
    /// Argument value rejected
    UsageInvalidArgument,
    /// Operator declined a confirmation prompt
    UsageCancelled,
    /// Run interrupted by a signal
    UsageInterrupted,

    // =========================================================================
    // Internal Errors (E500-E599)
    // =========================================================================
    /// Local filesystem error
    InternalIo,
    /// Serialization/deserialization error
    InternalSerde,
    /// Logging system error
    InternalLogging,
}

impl ErrorCode {
    /// Returns the numeric error code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigEnvFileNotFound => 1,
            Self::ConfigEnvFileMalformed => 2,
            Self::ConfigMissingKey => 3,
            Self::ConfigInvalidValue => 4,
            Self::ConfigStackNotFound => 5,
            Self::ConfigStackParseError => 6,
            Self::ConfigStackInvalid => 7,

            Self::PrereqBinaryMissing => 100,
            Self::PrereqClusterUnreachable => 101,
            Self::PrereqCertManagerMissing => 102,

            Self::DeployStepFailed => 200,
            Self::DeployReleaseNotFound => 201,
            Self::DeployReleaseExists => 202,
            Self::DeployBackupFailed => 203,
            Self::DeployCommandSpawn => 204,

            Self::ApiUnexpectedStatus => 300,
            Self::ApiRequestFailed => 301,
            Self::ApiMalformedResponse => 302,
            Self::ApiMissingField => 303,
            Self::ApiPollTimeout => 304,

            Self::UsageInvalidArgument => 400,
            Self::UsageCancelled => 401,
            Self::UsageInterrupted => 402,

            Self::InternalIo => 500,
            Self::InternalSerde => 501,
            Self::InternalLogging => 502,
        }
    }

    /// Returns the formatted error code string (e.g., "EDC-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("EDC-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Prerequisite,
            200..=299 => ErrorCategory::Deploy,
            300..=399 => ErrorCategory::Api,
            400..=499 => ErrorCategory::Usage,
            _ => ErrorCategory::Internal,
        }
    }

    /// Process exit code used when this error terminates the CLI.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UsageInvalidArgument => 2,
            Self::UsageCancelled => 4,
            Self::UsageInterrupted => 130,
            _ => match self.category() {
                ErrorCategory::Api => 3,
                _ => 1,
            },
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exit_code: self.exit_code(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigEnvFileNotFound => "Environment file not found",
            Self::ConfigEnvFileMalformed => "Environment file contains a malformed line",
            Self::ConfigMissingKey => "Required environment variable is missing",
            Self::ConfigInvalidValue => "Environment variable has invalid value",
            Self::ConfigStackNotFound => "Stack configuration file not found",
            Self::ConfigStackParseError => "Stack configuration contains invalid TOML syntax",
            Self::ConfigStackInvalid => "Stack configuration contains invalid values",

            Self::PrereqBinaryMissing => "Required binary not found on PATH",
            Self::PrereqClusterUnreachable => "Kubernetes cluster is not reachable",
            Self::PrereqCertManagerMissing => "cert-manager is not installed in the cluster",

            Self::DeployStepFailed => "Deployment step failed",
            Self::DeployReleaseNotFound => "Helm release not found",
            Self::DeployReleaseExists => "Helm release already exists",
            Self::DeployBackupFailed => "Failed to back up release before change",
            Self::DeployCommandSpawn => "Failed to start external command",

            Self::ApiUnexpectedStatus => "Management API returned an unexpected status",
            Self::ApiRequestFailed => "Management API request failed",
            Self::ApiMalformedResponse => "Management API returned a malformed response",
            Self::ApiMissingField => "Management API response is missing a required field",
            Self::ApiPollTimeout => "Negotiation did not complete in time",

            Self::UsageInvalidArgument => "Invalid argument",
            Self::UsageCancelled => "Operation cancelled by user",
            Self::UsageInterrupted => "Interrupted",

            Self::InternalIo => "Local filesystem error",
            Self::InternalSerde => "Serialization/deserialization error",
            Self::InternalLogging => "Logging system error",
        }
    }

    /// Returns remediation steps for this error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigEnvFileNotFound => &[
                "Create a .env file in the working directory",
                "Pass --env-file to point at an existing file",
            ],
            Self::ConfigEnvFileMalformed => &[
                "Use KEY=VALUE lines, one per line",
                "Close every opening quote on the same line",
            ],
            Self::ConfigMissingKey => &[
                "Add the missing key to the .env file",
                "Required keys: ASSET_ID, PROVIDER_URL, PROVIDER_BPN, PROVIDER_API_KEY, CONSUMER_URL, CONSUMER_BPN, CONSUMER_API_KEY",
            ],
            Self::ConfigInvalidValue => &[
                "Check the value against the expected type in the message",
                "Booleans accept true/false/1/0/yes/no/on/off",
            ],
            Self::ConfigStackNotFound => &[
                "Check the path given with --config or EDCCTL_CONFIG",
                "Omit --config to use the built-in stack defaults",
            ],
            Self::ConfigStackParseError => &[
                "Check TOML syntax at the indicated line",
                "Ensure all strings are properly quoted",
            ],
            Self::ConfigStackInvalid => &[
                "Give every component a non-empty, unique name",
                "Set chart and repo_url for every component",
            ],

            Self::PrereqBinaryMissing => &[
                "Install kubectl: https://kubernetes.io/docs/tasks/tools/",
                "Install helm: https://helm.sh/docs/intro/install/",
                "Ensure both binaries are on PATH",
            ],
            Self::PrereqClusterUnreachable => &[
                "Run 'kubectl cluster-info' to check connectivity",
                "Check the current context with 'kubectl config current-context'",
                "Set KUBECONFIG if the kubeconfig is not in the default location",
            ],
            Self::PrereqCertManagerMissing => &[
                "Install the full stack with 'edcctl install --with-infra'",
                "Install cert-manager separately if TLS ingress is required",
            ],

            Self::DeployStepFailed => &[
                "Re-run with --verbose to see the full command output",
                "Inspect the release with 'edcctl status'",
                "Restore from the backup directory printed before the change",
            ],
            Self::DeployReleaseNotFound => &[
                "List releases with 'helm list -A'",
                "Check the --namespace and --release values",
                "Use 'edcctl install' to create the release",
            ],
            Self::DeployReleaseExists => &[
                "Use 'edcctl upgrade' to change an existing release",
                "Use 'edcctl uninstall' first to reinstall from scratch",
            ],
            Self::DeployBackupFailed => &[
                "Check that the backup directory is writable",
                "Pass --backup-dir to choose another location",
                "Pass --no-backup to skip the backup",
            ],
            Self::DeployCommandSpawn => &[
                "Ensure the binary is executable",
                "Check PATH in the current shell",
            ],

            Self::ApiUnexpectedStatus => &[
                "Check the API key configured for this connector",
                "Re-run with DEBUG=true to log request and response bodies",
            ],
            Self::ApiRequestFailed => &[
                "Verify PROVIDER_URL and CONSUMER_URL are reachable",
                "Check DNS and TLS certificates of the connector ingress",
            ],
            Self::ApiMalformedResponse => &[
                "Check that the URL points at an EDC Management API v3",
                "Re-run with DEBUG=true to log the response body",
            ],
            Self::ApiMissingField => &[
                "Check that the provider offers the asset to this consumer BPN",
                "Re-run with DEBUG=true to log the response body",
            ],
            Self::ApiPollTimeout => &[
                "Check the provider connector logs for the negotiation",
                "Increase --poll-attempts or --poll-interval",
            ],

            Self::UsageInvalidArgument => &[
                "Run 'edcctl --help' for valid arguments",
                "Kubernetes names use lowercase letters, digits and '-'",
            ],
            Self::UsageCancelled => &["Pass --force to skip the confirmation prompt"],
            Self::UsageInterrupted => &["Re-run the command; creation steps are idempotent"],

            Self::InternalIo => &[
                "Check file permissions and free disk space",
                "Re-run with --verbose for details",
            ],
            Self::InternalSerde => &["Re-run with --verbose for details"],
            Self::InternalLogging => &["Check EDCCTL_LOG_LEVEL and EDCCTL_LOG_FORMAT"],
        }
    }

    /// Returns all error codes.
    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigEnvFileNotFound,
            Self::ConfigEnvFileMalformed,
            Self::ConfigMissingKey,
            Self::ConfigInvalidValue,
            Self::ConfigStackNotFound,
            Self::ConfigStackParseError,
            Self::ConfigStackInvalid,
            Self::PrereqBinaryMissing,
            Self::PrereqClusterUnreachable,
            Self::PrereqCertManagerMissing,
            Self::DeployStepFailed,
            Self::DeployReleaseNotFound,
            Self::DeployReleaseExists,
            Self::DeployBackupFailed,
            Self::DeployCommandSpawn,
            Self::ApiUnexpectedStatus,
            Self::ApiRequestFailed,
            Self::ApiMalformedResponse,
            Self::ApiMissingField,
            Self::ApiPollTimeout,
            Self::UsageInvalidArgument,
            Self::UsageCancelled,
            Self::UsageInterrupted,
            Self::InternalIo,
            Self::InternalSerde,
            Self::InternalLogging,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration errors (E001-E099)
    Config,
    /// Missing tools or cluster access (E100-E199)
    Prerequisite,
    /// Release lifecycle errors (E200-E299)
    Deploy,
    /// Management API errors (E300-E399)
    Api,
    /// Argument and interaction errors (E400-E499)
    Usage,
    /// Internal/unexpected errors (E500-E599)
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable name for the category.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Prerequisite => "Prerequisite",
            Self::Deploy => "Deploy",
            Self::Api => "API",
            Self::Usage => "Usage",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete error entry with all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "EDC-E001")
    pub code: String,
    /// Error category
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
    /// Exit code of the process
    pub exit_code: u8,
}

impl ErrorEntry {
    /// Formats the error for display with full remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }

    /// Formats the error as a single line.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brief())
    }
}
