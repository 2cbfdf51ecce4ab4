use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clouddoctor_application::{AclAccessDeniedPolicy, CheckSettings};
use clouddoctor_core::{AppError, AppResult};

#[derive(Debug, Clone)]
pub(crate) struct AuditorConfig {
    pub(crate) snapshot_path: PathBuf,
    pub(crate) account_id: String,
    pub(crate) role_name: String,
    pub(crate) external_id: Option<String>,
    /// `None` runs the whole catalog.
    pub(crate) check_ids: Option<Vec<String>>,
    pub(crate) settings: CheckSettings,
    pub(crate) poll_interval: Duration,
    pub(crate) timeout: Duration,
}

impl AuditorConfig {
    pub(crate) fn load() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let snapshot_path = PathBuf::from(required(&lookup, "AUDIT_SNAPSHOT_PATH")?);
        let account_id = required(&lookup, "AUDIT_ACCOUNT_ID")?;
        let role_name = required(&lookup, "AUDIT_ROLE_NAME")?;
        let external_id = optional(&lookup, "AUDIT_EXTERNAL_ID");
        let check_ids = optional(&lookup, "AUDIT_CHECKS").map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|check_id| !check_id.is_empty())
                .map(str::to_owned)
                .collect()
        });

        let resource_parallelism = parse(&lookup, "AUDIT_RESOURCE_PARALLELISM", 8_usize)?;
        let acl_access_denied = match optional(&lookup, "AUDIT_ACL_ACCESS_DENIED") {
            Some(value) => AclAccessDeniedPolicy::parse(value.as_str())?,
            None => AclAccessDeniedPolicy::default(),
        };
        let access_key_max_age_days = parse(&lookup, "AUDIT_ACCESS_KEY_MAX_AGE_DAYS", 90_u32)?;
        let settings = CheckSettings {
            resource_parallelism,
            acl_access_denied,
            access_key_max_age_days,
        };
        settings.validate()?;

        let poll_interval_ms = parse(&lookup, "AUDIT_POLL_INTERVAL_MS", 250_u64)?;
        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "AUDIT_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        let timeout_seconds = parse(&lookup, "AUDIT_TIMEOUT_SECONDS", 300_u64)?;
        if timeout_seconds == 0 {
            return Err(AppError::Validation(
                "AUDIT_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            snapshot_path,
            account_id,
            role_name,
            external_id,
            check_ids,
            settings,
            poll_interval: Duration::from_millis(poll_interval_ms),
            timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    optional(lookup, name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, name) {
        Some(value) => value.parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
