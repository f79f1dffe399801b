/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::error::method::MethodError;
use types::id::Id;
use utils::map::vec_map::VecMap;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMailboxesRequest {
    pub account_id: Option<serde_json::Value>,
    pub ids: Option<Vec<Id>>,
    pub properties: Option<Vec<String>>,
}

impl GetMailboxesRequest {
    pub fn validate(&self) -> Result<(), MethodError> {
        if self.account_id.is_some() {
            return Err(MethodError::unsupported_field(
                "accountId",
                "GetMailboxesRequest",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMailboxesResponse {
    pub state: String,

    /// Mailbox objects, reduced to the requested `properties` when the
    /// request names any.
    pub list: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_found: Vec<Id>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxObject {
    pub id: Id,

    pub name: String,

    pub parent_id: Option<Id>,

    /// Owner-private; always `None` when projected for another viewer.
    pub role: Option<&'static str>,

    pub sort_order: u32,

    pub total_messages: usize,

    pub unread_messages: usize,

    pub total_threads: usize,

    pub unread_threads: usize,

    pub may_read_items: bool,

    pub may_add_items: bool,

    pub may_remove_items: bool,

    pub may_create_child: bool,

    pub may_rename: bool,

    pub may_delete: bool,

    pub namespace: MailboxNamespace,

    pub shared_with: VecMap<String, Vec<&'static str>>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MailboxNamespace {
    #[serde(rename = "type")]
    pub type_: &'static str,

    pub owner: Option<String>,
}

impl MailboxNamespace {
    pub fn personal() -> Self {
        MailboxNamespace {
            type_: "Personal",
            owner: None,
        }
    }

    pub fn delegated(owner: String) -> Self {
        MailboxNamespace {
            type_: "Delegated",
            owner: Some(owner),
        }
    }
}
