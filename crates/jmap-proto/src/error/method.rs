/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::borrow::Cow;
use std::fmt;

/// Whole-call failure, serialized as the `error` response. Per-item
/// failures within a batch use [`super::set::SetError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodError {
    InvalidArguments(Cow<'static, str>),
    RequestTooLarge,
    ServerFail(Cow<'static, str>),
}

impl MethodError {
    pub fn invalid_arguments(description: impl Into<Cow<'static, str>>) -> Self {
        MethodError::InvalidArguments(description.into())
    }

    pub fn server_fail(description: impl Into<Cow<'static, str>>) -> Self {
        MethodError::ServerFail(description.into())
    }

    /// `accountId`/`ifInState`-style fields the draft dialect does not
    /// implement are refused before any per-item processing.
    pub fn unsupported_field(field: &str, request: &str) -> Self {
        MethodError::InvalidArguments(
            format!("The field '{field}' of '{request}' is not supported").into(),
        )
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            MethodError::InvalidArguments(_) => "invalidArguments",
            MethodError::RequestTooLarge => "requestTooLarge",
            MethodError::ServerFail(_) => "error",
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MethodError::InvalidArguments(description)
            | MethodError::ServerFail(description) => Some(description.as_ref()),
            MethodError::RequestTooLarge => None,
        }
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "{}: {}", self.error_type(), description),
            None => f.write_str(self.error_type()),
        }
    }
}

impl std::error::Error for MethodError {}

impl serde::Serialize for MethodError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.error_type())?;
        if let Some(description) = self.description() {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}
