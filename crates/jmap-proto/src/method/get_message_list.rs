/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{error::method::MethodError, filter::Filter, sort::Comparator};
use types::id::Id;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessageListRequest {
    pub account_id: Option<serde_json::Value>,
    pub filter: Option<Filter>,
    pub sort: Option<Vec<Comparator>>,
    pub position: Option<i64>,
    pub limit: Option<usize>,
    pub collapse_threads: Option<bool>,
    pub fetch_messages: Option<bool>,
    pub fetch_message_properties: Option<Vec<String>>,
}

impl GetMessageListRequest {
    pub fn validate(&self) -> Result<(), MethodError> {
        if self.account_id.is_some() {
            return Err(MethodError::unsupported_field(
                "accountId",
                "GetMessageListRequest",
            ));
        }
        if let Some(filter) = &self.filter {
            filter
                .validate()
                .map_err(|err| MethodError::invalid_arguments(err.to_string()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessageListResponse {
    pub message_ids: Vec<Id>,

    pub position: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}
