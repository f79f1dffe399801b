/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::{method::MethodError, set::SetError},
    method::send_mdn::MdnObject,
};
use types::id::Id;
use utils::map::vec_map::VecMap;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMessagesRequest {
    pub account_id: Option<serde_json::Value>,
    pub if_in_state: Option<serde_json::Value>,
    pub create: Option<VecMap<String, MessageCreate>>,
    pub update: Option<VecMap<Id, MessagePatch>>,
    pub destroy: Option<Vec<Id>>,
    #[serde(rename = "sendMDN")]
    pub send_mdn: Option<VecMap<String, MdnObject>>,
}

impl SetMessagesRequest {
    pub fn validate(&self) -> Result<(), MethodError> {
        if self.account_id.is_some() {
            return Err(MethodError::unsupported_field(
                "accountId",
                "SetMessagesRequest",
            ));
        }
        if self.if_in_state.is_some() {
            return Err(MethodError::unsupported_field(
                "ifInState",
                "SetMessagesRequest",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreate {
    pub mailbox_ids: Option<Vec<Id>>,
    pub keywords: Option<VecMap<String, bool>>,
    pub is_unread: Option<bool>,
    pub is_flagged: Option<bool>,
    pub is_answered: Option<bool>,
    pub is_draft: Option<bool>,
    pub is_forwarded: Option<bool>,
    pub from: Option<EmailAddress>,
    pub to: Option<Vec<EmailAddress>>,
    pub cc: Option<Vec<EmailAddress>>,
    pub bcc: Option<Vec<EmailAddress>>,
    pub reply_to: Option<Vec<EmailAddress>>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub headers: Option<VecMap<String, String>>,
}

impl MessageCreate {
    pub fn has_flag_shorthand(&self) -> bool {
        self.is_unread.is_some()
            || self.is_flagged.is_some()
            || self.is_answered.is_some()
            || self.is_draft.is_some()
            || self.is_forwarded.is_some()
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    pub mailbox_ids: Option<Vec<Id>>,
    pub keywords: Option<VecMap<String, bool>>,
    pub is_unread: Option<bool>,
    pub is_flagged: Option<bool>,
    pub is_answered: Option<bool>,
    pub is_draft: Option<bool>,
    pub is_forwarded: Option<bool>,
}

impl MessagePatch {
    pub fn has_flag_shorthand(&self) -> bool {
        self.is_unread.is_some()
            || self.is_flagged.is_some()
            || self.is_answered.is_some()
            || self.is_draft.is_some()
            || self.is_forwarded.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.mailbox_ids.is_none() && self.keywords.is_none() && !self.has_flag_shorthand()
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub blob_id: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub cid: Option<String>,
    pub is_inline: Option<bool>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMessagesResponse {
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub created: VecMap<String, CreatedMessage>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<Id>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub destroyed: Vec<Id>,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_created: VecMap<String, SetError>,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_updated: VecMap<Id, SetError>,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_destroyed: VecMap<Id, SetError>,

    #[serde(rename = "MDNSent")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub mdn_sent: VecMap<String, CreatedMessage>,

    #[serde(rename = "MDNNotSent")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub mdn_not_sent: VecMap<String, SetError>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedMessage {
    pub id: Id,
}

impl SetMessagesResponse {
    pub fn created(&mut self, creation_id: String, id: Id) {
        self.created.append(creation_id, CreatedMessage { id });
    }

    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty() || !self.destroyed.is_empty()
    }
}
