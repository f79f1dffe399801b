/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::error::method::MethodError;
use std::borrow::Cow;

/// Per-item error collected into the `notCreated`/`notUpdated`/
/// `notDestroyed`/`MDNNotSent` maps; the call itself still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SetError {
    #[serde(rename = "type")]
    pub type_: SetErrorType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Cow<'static, str>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Cow<'static, str>>>,

    #[serde(rename = "attachmentsNotFound")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments_not_found: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SetErrorType {
    #[serde(rename = "invalidArguments")]
    InvalidArguments,
    #[serde(rename = "invalidProperties")]
    InvalidProperties,
    #[serde(rename = "notFound")]
    NotFound,
    #[serde(rename = "maxQuotaReached")]
    MaxQuotaReached,
    #[serde(rename = "anErrorOccurred")]
    AnErrorOccurred,
}

impl SetErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetErrorType::InvalidArguments => "invalidArguments",
            SetErrorType::InvalidProperties => "invalidProperties",
            SetErrorType::NotFound => "notFound",
            SetErrorType::MaxQuotaReached => "maxQuotaReached",
            SetErrorType::AnErrorOccurred => "anErrorOccurred",
        }
    }
}

impl SetError {
    pub fn new(type_: SetErrorType) -> Self {
        SetError {
            type_,
            description: None,
            properties: None,
            attachments_not_found: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<Cow<'static, str>>) -> Self {
        self.properties = Some(vec![property.into()]);
        self
    }

    pub fn with_properties(
        mut self,
        properties: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
    ) -> Self {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attachments_not_found(mut self, blob_ids: Vec<String>) -> Self {
        self.attachments_not_found = Some(blob_ids);
        self
    }

    pub fn invalid_arguments() -> Self {
        Self::new(SetErrorType::InvalidArguments)
    }

    pub fn invalid_properties() -> Self {
        Self::new(SetErrorType::InvalidProperties)
    }

    pub fn not_found() -> Self {
        Self::new(SetErrorType::NotFound)
    }

    pub fn max_quota_reached() -> Self {
        Self::new(SetErrorType::MaxQuotaReached)
    }

    pub fn an_error_occurred() -> Self {
        Self::new(SetErrorType::AnErrorOccurred)
    }
}

/// A whole-call failure hit while processing one batch item degrades to a
/// per-item catch-all so its neighbors still complete.
impl From<MethodError> for SetError {
    fn from(err: MethodError) -> Self {
        SetError::an_error_occurred().with_description(err.to_string())
    }
}
