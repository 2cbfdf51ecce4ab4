//! Pure queries over parsed access-control documents.

use crate::{PolicyDocument, PolicyStatement};

/// Statements that expose dangerous actions to anyone.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicGrant<'a> {
    matched_statements: Vec<&'a PolicyStatement>,
}

impl<'a> PublicGrant<'a> {
    /// Returns whether at least one statement matched.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        !self.matched_statements.is_empty()
    }

    /// Returns the matching statements in document order.
    #[must_use]
    pub fn matched_statements(&self) -> &[&'a PolicyStatement] {
        &self.matched_statements
    }
}

/// Three-way verdict for an optional access-control document.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyVerdict<'a> {
    /// No document exists, so there is nothing to evaluate.
    NotConfigured,
    /// The document grants the queried capability.
    Granted(Vec<&'a PolicyStatement>),
    /// The document exists and does not grant the capability.
    NotGranted,
}

/// Finds `Allow` statements with a wildcard principal whose actions cover
/// any of `dangerous_actions`.
#[must_use]
pub fn has_public_dangerous_grant<'a>(
    document: &'a PolicyDocument,
    dangerous_actions: &[&str],
) -> PublicGrant<'a> {
    PublicGrant {
        matched_statements: document
            .statements()
            .iter()
            .filter(|statement| {
                statement.is_allow()
                    && statement.has_wildcard_principal()
                    && statement.grants_any(dangerous_actions)
            })
            .collect(),
    }
}

/// Returns whether some `Allow` statement grants any of `required_actions`
/// over exactly `required_resource_arn`.
///
/// Wildcard or prefix resources never satisfy the query.
#[must_use]
pub fn is_resource_scoped(
    document: &PolicyDocument,
    required_actions: &[&str],
    required_resource_arn: &str,
) -> bool {
    document.statements().iter().any(|statement| {
        statement.is_allow()
            && statement.grants_any(required_actions)
            && statement.lists_resource(required_resource_arn)
    })
}

/// Evaluates public exposure of an optional document.
#[must_use]
pub fn evaluate_public_exposure<'a>(
    document: Option<&'a PolicyDocument>,
    dangerous_actions: &[&str],
) -> PolicyVerdict<'a> {
    let Some(document) = document else {
        return PolicyVerdict::NotConfigured;
    };

    let grant = has_public_dangerous_grant(document, dangerous_actions);
    if grant.is_granted() {
        PolicyVerdict::Granted(grant.matched_statements)
    } else {
        PolicyVerdict::NotGranted
    }
}
