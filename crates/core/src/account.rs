use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, NonEmptyString};

/// Cloud account under audit plus the role used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReference {
    account_id: String,
    role_name: String,
    external_id: Option<String>,
}

impl AccountReference {
    /// Creates a validated account reference.
    ///
    /// Account identifiers are twelve ASCII digits. A blank external id is
    /// treated as absent.
    pub fn new(
        account_id: impl Into<String>,
        role_name: impl Into<String>,
        external_id: Option<String>,
    ) -> AppResult<Self> {
        let account_id = account_id.into().trim().to_owned();
        if account_id.len() != 12 || !account_id.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "account id '{account_id}' must be exactly 12 digits"
            )));
        }

        let role_name = NonEmptyString::new(role_name.into().trim())
            .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))?;

        let external_id = external_id
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            account_id,
            role_name: role_name.into(),
            external_id,
        })
    }

    /// Returns the twelve digit account identifier.
    #[must_use]
    pub fn account_id(&self) -> &str {
        self.account_id.as_str()
    }

    /// Returns the name of the role assumed for the audit.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns the external id presented when assuming the role.
    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Returns the ARN of the role assumed for the audit.
    #[must_use]
    pub fn role_arn(&self) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account_id, self.role_name)
    }
}
