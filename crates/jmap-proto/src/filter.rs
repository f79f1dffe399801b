/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use chrono::{DateTime, Utc};
use std::fmt;
use types::id::Id;

/// Maximum nesting depth of a filter tree, root included.
pub const MAX_FILTER_DEPTH: usize = 10;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Operator(FilterOperator),
    Condition(Box<FilterCondition>),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FilterOperator {
    pub operator: Operator,
    #[serde(default)]
    pub conditions: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum Operator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
}

/// Leaf predicate. A single condition object may carry several fields at
/// once; they combine with AND semantics.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    /// An operator node whose `operator` value is not AND/OR/NOT lands
    /// here instead of [`FilterOperator`]; validation turns it into a
    /// diagnostic rather than an empty match-all condition.
    pub operator: Option<serde_json::Value>,
    pub in_mailboxes: Option<Vec<Id>>,
    pub not_in_mailboxes: Option<Vec<Id>>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub is_flagged: Option<bool>,
    pub is_unread: Option<bool>,
    pub is_answered: Option<bool>,
    pub is_draft: Option<bool>,
    pub is_forwarded: Option<bool>,
    pub has_attachment: Option<bool>,
    pub text: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachments: Option<String>,
    pub attachment_file_name: Option<String>,
    pub header: Option<Vec<String>>,
    pub has_keyword: Option<String>,
    pub not_keyword: Option<String>,
}

impl FilterCondition {
    pub fn has_mailbox_clause(&self) -> bool {
        self.in_mailboxes.is_some() || self.not_in_mailboxes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    TooDeep,
    MailboxesInOperator,
    InvalidHeaderArity(usize),
    UnknownOperator(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::TooDeep => write!(
                f,
                "Filter depth is higher than maximum allowed value {MAX_FILTER_DEPTH}"
            ),
            FilterError::MailboxesInOperator => f.write_str(
                "'inMailboxes' and 'notInMailboxes' wrapped within Filter Operators \
                 are not implemented. Review your search request.",
            ),
            FilterError::InvalidHeaderArity(arity) => write!(
                f,
                "'header' condition expects one or two arguments, got {arity}"
            ),
            FilterError::UnknownOperator(operator) => {
                write!(f, "Unknown filter operator: {operator}")
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl Filter {
    /// Checks structural invariants before any message is evaluated:
    /// bounded depth, mailbox clauses only at the root, header arity.
    pub fn validate(&self) -> Result<(), FilterError> {
        self.validate_at(1)
    }

    fn validate_at(&self, depth: usize) -> Result<(), FilterError> {
        if depth > MAX_FILTER_DEPTH {
            return Err(FilterError::TooDeep);
        }
        match self {
            Filter::Operator(operator) => {
                for condition in &operator.conditions {
                    condition.validate_at(depth + 1)?;
                }
                Ok(())
            }
            Filter::Condition(condition) => {
                if let Some(operator) = &condition.operator {
                    return Err(FilterError::UnknownOperator(
                        operator.as_str().unwrap_or_default().to_string(),
                    ));
                }
                if depth > 1 && condition.has_mailbox_clause() {
                    return Err(FilterError::MailboxesInOperator);
                }
                if let Some(header) = &condition.header {
                    if header.is_empty() || header.len() > 2 {
                        return Err(FilterError::InvalidHeaderArity(header.len()));
                    }
                }
                Ok(())
            }
        }
    }
}
