/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod memory;
pub mod quota;

use crate::quota::{Quota, QuotaDelta};
use std::{fmt, sync::Arc};
use types::{
    AccountId, DocumentId,
    acl::AclGrant,
    keyword::Keyword,
    special_use::SpecialUse,
};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    Internal(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => f.write_str("not found"),
            StoreError::Internal(reason) => write!(f, "storage failure: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub id: DocumentId,
    pub account_id: AccountId,
    pub name: String,
    pub parent_id: Option<DocumentId>,
    pub role: SpecialUse,
    pub sort_order: u32,
    pub acls: Vec<AclGrant>,
    pub quota_root: String,
}

#[derive(Debug, Clone)]
pub struct MessageData {
    pub id: DocumentId,
    pub account_id: AccountId,
    pub mailbox_ids: Vec<DocumentId>,
    pub keywords: Vec<Keyword>,
    pub size: u64,
    pub received_at: i64,
    pub thread_id: DocumentId,
    pub raw: Arc<Vec<u8>>,
}

impl MessageData {
    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn in_mailbox(&self, mailbox_id: DocumentId) -> bool {
        self.mailbox_ids.contains(&mailbox_id)
    }
}

/// Sending identity of an account, used to validate the `from` address of
/// outgoing messages. Group addresses are ones the account may receive
/// through but never send as.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub email: String,
    pub aliases: Vec<String>,
    pub alias_domains: Vec<String>,
    pub group_addresses: Vec<String>,
}

impl Identity {
    pub fn may_send_as(&self, address: &str) -> bool {
        if self
            .group_addresses
            .iter()
            .any(|group| group.eq_ignore_ascii_case(address))
        {
            return false;
        }
        if self.email.eq_ignore_ascii_case(address)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(address))
        {
            return true;
        }
        address
            .rsplit_once('@')
            .map(|(local, domain)| {
                self.alias_domains
                    .iter()
                    .any(|alias_domain| alias_domain.eq_ignore_ascii_case(domain))
                    && self
                        .email
                        .rsplit_once('@')
                        .is_some_and(|(own_local, _)| own_local.eq_ignore_ascii_case(local))
            })
            .unwrap_or(false)
    }
}

/// Narrow contract onto the physical mailbox store. The engine never
/// creates or destroys mailboxes/messages directly; it issues the intents
/// below after its own invariants have been checked.
#[async_trait::async_trait]
pub trait MailStore: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<AccountId>>;

    async fn principal_name(&self, account_id: AccountId) -> Result<Option<String>>;

    async fn identity(&self, account_id: AccountId) -> Result<Option<Identity>>;

    async fn list_mailboxes(&self, account_id: AccountId) -> Result<Vec<Mailbox>>;

    async fn get_mailbox(
        &self,
        account_id: AccountId,
        mailbox_id: DocumentId,
    ) -> Result<Option<Mailbox>>;

    async fn mailbox_by_role(
        &self,
        account_id: AccountId,
        role: SpecialUse,
    ) -> Result<Option<Mailbox>>;

    async fn get_acl(
        &self,
        account_id: AccountId,
        mailbox_id: DocumentId,
    ) -> Result<Vec<AclGrant>>;

    async fn list_messages(&self, account_id: AccountId) -> Result<Vec<MessageData>>;

    async fn get_message(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
    ) -> Result<Option<MessageData>>;

    /// Appends a message. Callers are expected to have reserved quota for
    /// the append beforehand; the counters are not touched here.
    async fn append_message(
        &self,
        account_id: AccountId,
        mailbox_ids: Vec<DocumentId>,
        raw: Vec<u8>,
        keywords: Vec<Keyword>,
        received_at: i64,
    ) -> Result<MessageData>;

    async fn set_keywords(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
        keywords: Vec<Keyword>,
    ) -> Result<()>;

    /// Replaces the message's mailbox membership set.
    async fn move_message(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
        mailbox_ids: Vec<DocumentId>,
    ) -> Result<()>;

    /// Removes the message from all memberships and releases its quota.
    async fn delete_message(&self, account_id: AccountId, message_id: DocumentId) -> Result<()>;

    async fn get_quota(&self, quota_root: &str) -> Result<Quota>;

    /// Atomically checks and reserves quota for the given delta. Returns
    /// `false` without reserving when a limit would be exceeded.
    /// Authorization is serialized per quota-root.
    async fn reserve_quota(&self, quota_root: &str, delta: QuotaDelta) -> Result<bool>;

    async fn release_quota(&self, quota_root: &str, delta: QuotaDelta) -> Result<()>;

    async fn resolve_attachment(&self, blob_id: &str) -> Result<Option<Vec<u8>>>;
}

/// Envelope handed to the delivery pipeline when a message reaches the
/// Outbox.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: String,
    pub recipients: Vec<String>,
    pub raw: Arc<Vec<u8>>,
}

#[async_trait::async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn submit_for_delivery(&self, envelope: Envelope) -> Result<()>;
}
