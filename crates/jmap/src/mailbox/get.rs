/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    AccessToken, Engine,
    api::acl::{EffectiveAcl, MailboxRights},
    store_fail,
};
use ahash::AHashSet;
use jmap_proto::{
    error::method::MethodError,
    method::get_mailboxes::{GetMailboxesRequest, GetMailboxesResponse, MailboxObject},
};
use store::{Mailbox, MessageData};
use types::{acl::Acl, id::Id, keyword::Keyword, special_use::SpecialUse};

impl Engine {
    pub async fn get_mailboxes(
        &self,
        request: GetMailboxesRequest,
        access_token: &AccessToken,
    ) -> Result<GetMailboxesResponse, MethodError> {
        request.validate()?;

        // Gather the viewer's visible mailbox set: everything in accounts
        // the viewer belongs to, plus mailboxes shared with at least
        // Lookup.
        let mut visible = Vec::new();
        for account_id in self.store.list_accounts().await.map_err(store_fail)? {
            let is_owner = access_token.is_member(account_id);
            let mailboxes = self
                .store
                .list_mailboxes(account_id)
                .await
                .map_err(store_fail)?;
            if mailboxes.is_empty() {
                continue;
            }
            let owner_name = self
                .store
                .principal_name(account_id)
                .await
                .map_err(store_fail)?
                .unwrap_or_else(|| account_id.to_string());
            let messages = self
                .store
                .list_messages(account_id)
                .await
                .map_err(store_fail)?;

            for mailbox in mailboxes {
                let effective_acl = mailbox.acls.as_slice().effective_acl(access_token);
                if !is_owner && !effective_acl.contains(Acl::Lookup) {
                    continue;
                }
                let object = self
                    .build_mailbox(
                        &mailbox,
                        &owner_name,
                        &messages,
                        is_owner,
                        effective_acl.contains(Acl::Read),
                        access_token,
                    )
                    .await?;
                visible.push((mailbox.id, object));
            }
        }

        let mut response = GetMailboxesResponse {
            state: "000001".to_string(),
            ..Default::default()
        };

        if let Some(ids) = request.ids {
            for id in ids {
                match visible.iter().find(|(mailbox_id, _)| {
                    *mailbox_id == id.document_id()
                }) {
                    Some((_, object)) => response
                        .list
                        .push(project_properties(object, request.properties.as_deref())),
                    None => response.not_found.push(id),
                }
            }
        } else {
            for (_, object) in &visible {
                response
                    .list
                    .push(project_properties(object, request.properties.as_deref()));
            }
        }

        Ok(response)
    }

    async fn build_mailbox(
        &self,
        mailbox: &Mailbox,
        owner_name: &str,
        messages: &[MessageData],
        is_owner: bool,
        may_read: bool,
        access_token: &AccessToken,
    ) -> Result<MailboxObject, MethodError> {
        // The Outbox is a transient staging area, never a durable view.
        let (total_messages, unread_messages, total_threads, unread_threads) =
            if mailbox.role == SpecialUse::Outbox || !(is_owner || may_read) {
                (0, 0, 0, 0)
            } else {
                let in_mailbox = messages
                    .iter()
                    .filter(|m| m.in_mailbox(mailbox.id))
                    .collect::<Vec<_>>();
                let unread = in_mailbox
                    .iter()
                    .filter(|m| !m.has_keyword(&Keyword::Seen))
                    .collect::<Vec<_>>();
                (
                    in_mailbox.len(),
                    unread.len(),
                    in_mailbox
                        .iter()
                        .map(|m| m.thread_id)
                        .collect::<AHashSet<_>>()
                        .len(),
                    unread
                        .iter()
                        .map(|m| m.thread_id)
                        .collect::<AHashSet<_>>()
                        .len(),
                )
            };

        let rights = if is_owner {
            MailboxRights::owner()
        } else {
            MailboxRights::shared(mailbox.acls.as_slice().effective_acl(access_token))
        };

        Ok(MailboxObject {
            id: Id::from(mailbox.id),
            name: mailbox.name.clone(),
            parent_id: mailbox.parent_id.map(Id::from),
            // The role is owner-private metadata.
            role: if is_owner {
                mailbox.role.as_str()
            } else {
                None
            },
            sort_order: mailbox.sort_order,
            total_messages,
            unread_messages,
            total_threads,
            unread_threads,
            may_read_items: rights.may_read_items,
            may_add_items: rights.may_add_items,
            may_remove_items: rights.may_remove_items,
            may_create_child: rights.may_create_child,
            may_rename: rights.may_rename,
            may_delete: rights.may_delete,
            namespace: self.namespace(mailbox, owner_name, access_token),
            shared_with: self.shared_with(mailbox, access_token).await?,
        })
    }
}

/// Reduces a mailbox object to the requested properties; `id` is always
/// retained. Unknown property names are ignored.
fn project_properties(
    object: &MailboxObject,
    properties: Option<&[String]>,
) -> serde_json::Value {
    let value = serde_json::to_value(object).unwrap_or_default();
    match properties {
        Some(properties) => match value {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .filter(|(key, _)| {
                        key == "id" || properties.iter().any(|p| p == key)
                    })
                    .collect(),
            ),
            other => other,
        },
        None => value,
    }
}
