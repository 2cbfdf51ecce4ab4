use thiserror::Error;

/// Result type of one provider call.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider error codes meaning "the queried configuration does not exist".
const NOT_CONFIGURED_CODES: &[&str] = &[
    "NoSuchBucketPolicy",
    "ReplicationConfigurationNotFoundError",
    "ServerSideEncryptionConfigurationNotFoundError",
    "NoSuchEntity",
];

/// Provider error codes meaning "the auditor may not read this".
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
];

/// Failure of one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The queried configuration is absent.
    #[error("{code}: {message}")]
    NotConfigured {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The auditor's credentials may not perform the call.
    #[error("{code}: {message}")]
    AccessDenied {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// Any other provider failure.
    #[error("{code}: {message}")]
    Service {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
}

impl ProviderError {
    /// Classifies a provider error by its error code.
    #[must_use]
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if NOT_CONFIGURED_CODES.contains(&code.as_str()) {
            Self::NotConfigured { code, message }
        } else if ACCESS_DENIED_CODES.contains(&code.as_str()) {
            Self::AccessDenied { code, message }
        } else {
            Self::Service { code, message }
        }
    }

    /// Returns the provider error code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::NotConfigured { code, .. }
            | Self::AccessDenied { code, .. }
            | Self::Service { code, .. } => code.as_str(),
        }
    }
}

/// Classified outcome of fetching one resource-scoped configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    /// The configuration exists.
    Found(T),
    /// The provider reported that the configuration does not exist.
    Absent,
    /// The call failed; the resource cannot be judged from this call.
    Failed(ProviderError),
}

impl<T> Probe<T> {
    /// Classifies one call's result. Only `absence_code` means absence; every
    /// other error, including other "not configured" codes, is a failure.
    pub fn classify(result: ProviderResult<T>, absence_code: &str) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(ProviderError::NotConfigured { code, .. }) if code == absence_code => Self::Absent,
            Err(error) => Self::Failed(error),
        }
    }
}
