use std::collections::{BTreeMap, BTreeSet};

use clouddoctor_core::{AppError, AppResult};
use serde_json::Value;

/// Principal key whose wildcard value means "any identity".
const IDENTITY_PRINCIPAL_KEY: &str = "AWS";

/// Effect of one access-control statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEffect {
    /// Grants the listed actions.
    Allow,
    /// Denies the listed actions.
    Deny,
}

/// Principal of one access-control statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyPrincipal {
    /// No principal element (identity-based policies).
    Absent,
    /// Anyone: bare `*` or an identity map whose value is `*`.
    Wildcard,
    /// Explicit principals keyed by principal type.
    Specific(BTreeMap<String, BTreeSet<String>>),
}

/// One parsed statement of an access-control document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    sid: Option<String>,
    effect: PolicyEffect,
    principal: PolicyPrincipal,
    actions: BTreeSet<String>,
    resources: BTreeSet<String>,
    raw: Value,
}

impl PolicyStatement {
    /// Parses one statement object.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Validation("policy statement must be a JSON object".to_owned())
        })?;

        let effect = match object.get("Effect").and_then(Value::as_str) {
            Some("Allow") => PolicyEffect::Allow,
            Some("Deny") => PolicyEffect::Deny,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown policy statement effect '{other}'"
                )));
            }
            None => {
                return Err(AppError::Validation(
                    "policy statement is missing Effect".to_owned(),
                ));
            }
        };

        let principal = match object.get("Principal") {
            None | Some(Value::Null) => PolicyPrincipal::Absent,
            Some(Value::String(value)) if value == "*" => PolicyPrincipal::Wildcard,
            Some(Value::String(value)) => PolicyPrincipal::Specific(BTreeMap::from([(
                IDENTITY_PRINCIPAL_KEY.to_owned(),
                BTreeSet::from([value.clone()]),
            )])),
            Some(Value::Object(entries)) => {
                let mut principals = BTreeMap::new();
                for (kind, values) in entries {
                    principals.insert(kind.clone(), string_set(values, "Principal")?);
                }

                if principals
                    .get(IDENTITY_PRINCIPAL_KEY)
                    .is_some_and(|identities| identities.contains("*"))
                {
                    PolicyPrincipal::Wildcard
                } else {
                    PolicyPrincipal::Specific(principals)
                }
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "policy statement Principal must be a string or an object".to_owned(),
                ));
            }
        };

        let actions = match object.get("Action") {
            Some(value) => string_set(value, "Action")?,
            None => BTreeSet::new(),
        };
        let resources = match object.get("Resource") {
            Some(value) => string_set(value, "Resource")?,
            None => BTreeSet::new(),
        };

        Ok(Self {
            sid: object
                .get("Sid")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            effect,
            principal,
            actions,
            resources,
            raw: value.clone(),
        })
    }

    /// Returns the optional statement id.
    #[must_use]
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// Returns the statement effect.
    #[must_use]
    pub fn effect(&self) -> PolicyEffect {
        self.effect
    }

    /// Returns the statement principal.
    #[must_use]
    pub fn principal(&self) -> &PolicyPrincipal {
        &self.principal
    }

    /// Returns the normalized action set.
    #[must_use]
    pub fn actions(&self) -> &BTreeSet<String> {
        &self.actions
    }

    /// Returns the normalized resource set.
    #[must_use]
    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    /// Returns the statement exactly as the provider returned it.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns whether the statement allows.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.effect == PolicyEffect::Allow
    }

    /// Returns whether the principal is anyone.
    #[must_use]
    pub fn has_wildcard_principal(&self) -> bool {
        self.principal == PolicyPrincipal::Wildcard
    }

    /// Returns whether any statement action covers any of `wanted`.
    ///
    /// Statement actions ending in `*` cover every action with that prefix,
    /// so `*` and `s3:*` cover everything in scope. Comparison ignores ASCII
    /// case.
    #[must_use]
    pub fn grants_any(&self, wanted: &[&str]) -> bool {
        self.actions.iter().any(|pattern| {
            wanted
                .iter()
                .any(|action| action_pattern_matches(pattern, action))
        })
    }

    /// Returns whether `arn` is listed verbatim as a statement resource.
    #[must_use]
    pub fn lists_resource(&self, arn: &str) -> bool {
        self.resources.contains(arn)
    }
}

/// Parsed access-control document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    version: Option<String>,
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Parses a document from its JSON text.
    pub fn parse(text: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|error| {
            AppError::Validation(format!("policy document is not valid JSON: {error}"))
        })?;
        Self::from_value(&value)
    }

    /// Parses a document from an already decoded JSON value.
    ///
    /// `Statement` may be a single object or a sequence of objects.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Validation("policy document must be a JSON object".to_owned())
        })?;

        let statements = match object.get("Statement") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(PolicyStatement::from_value)
                .collect::<AppResult<Vec<_>>>()?,
            Some(single @ Value::Object(_)) => vec![PolicyStatement::from_value(single)?],
            Some(_) => {
                return Err(AppError::Validation(
                    "policy document Statement must be an object or an array".to_owned(),
                ));
            }
        };

        Ok(Self {
            version: object
                .get("Version")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            statements,
        })
    }

    /// Returns the policy language version, if declared.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns statements in document order.
    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }
}

fn action_pattern_matches(pattern: &str, action: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let action = action.to_ascii_lowercase();
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => pattern == action,
    }
}

fn string_set(value: &Value, field: &str) -> AppResult<BTreeSet<String>> {
    match value {
        Value::String(single) => Ok(BTreeSet::from([single.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(ToOwned::to_owned).ok_or_else(|| {
                    AppError::Validation(format!("policy {field} entries must be strings"))
                })
            })
            .collect(),
        _ => Err(AppError::Validation(format!(
            "policy {field} must be a string or an array of strings"
        ))),
    }
}
