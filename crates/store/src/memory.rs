/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    DeliveryQueue, Envelope, Identity, MailStore, Mailbox, MessageData, Result, StoreError,
    quota::{Quota, QuotaDelta},
};
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use types::{
    AccountId, DocumentId,
    acl::AclGrant,
    keyword::Keyword,
    special_use::SpecialUse,
};

/// In-memory reference backend. Not a production store: it exists so the
/// engine can be exercised without a storage service behind it.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Inner>,
    // Coarse lock over all roots; reserve_quota's check-then-commit relies
    // on it being held for the full read-modify-write.
    quotas: Mutex<AHashMap<String, Quota>>,
}

#[derive(Default)]
struct Inner {
    accounts: AHashMap<AccountId, AccountData>,
    blobs: AHashMap<String, Arc<Vec<u8>>>,
    next_account_id: AccountId,
    next_document_id: DocumentId,
}

struct AccountData {
    name: String,
    identity: Identity,
    mailboxes: Vec<Mailbox>,
    messages: Vec<MessageData>,
    threads: AHashMap<String, DocumentId>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }

    /// Provisions an account with the default mailbox tree.
    pub fn create_account(&self, name: &str) -> AccountId {
        let mut data = self.data.write();
        data.next_account_id += 1;
        let account_id = data.next_account_id;
        let mut account = AccountData {
            name: name.to_string(),
            identity: Identity {
                email: name.to_string(),
                ..Default::default()
            },
            mailboxes: Vec::new(),
            messages: Vec::new(),
            threads: AHashMap::new(),
        };

        for role in [
            SpecialUse::Inbox,
            SpecialUse::Archive,
            SpecialUse::Drafts,
            SpecialUse::Outbox,
            SpecialUse::Sent,
            SpecialUse::Trash,
            SpecialUse::Spam,
        ] {
            data.next_document_id += 1;
            account.mailboxes.push(Mailbox {
                id: data.next_document_id,
                account_id,
                name: role
                    .as_str()
                    .map(|role| {
                        let mut name = role.to_string();
                        name[..1].make_ascii_uppercase();
                        name
                    })
                    .unwrap_or_default(),
                parent_id: None,
                role,
                sort_order: role.default_sort_order(),
                acls: Vec::new(),
                quota_root: name.to_string(),
            });
        }

        data.accounts.insert(account_id, account);
        account_id
    }

    pub fn create_mailbox(
        &self,
        account_id: AccountId,
        name: &str,
        parent_id: Option<DocumentId>,
    ) -> DocumentId {
        let mut data = self.data.write();
        data.next_document_id += 1;
        let id = data.next_document_id;
        let account = data
            .accounts
            .get_mut(&account_id)
            .expect("unknown account");
        let quota_root = account.name.clone();
        account.mailboxes.push(Mailbox {
            id,
            account_id,
            name: name.to_string(),
            parent_id,
            role: SpecialUse::None,
            sort_order: SpecialUse::None.default_sort_order(),
            acls: Vec::new(),
            quota_root,
        });
        id
    }

    pub fn share_mailbox(&self, account_id: AccountId, mailbox_id: DocumentId, grant: AclGrant) {
        let mut data = self.data.write();
        if let Some(mailbox) = data
            .accounts
            .get_mut(&account_id)
            .and_then(|account| account.mailboxes.iter_mut().find(|m| m.id == mailbox_id))
        {
            mailbox.acls.retain(|acl| acl.account_id != grant.account_id);
            if !grant.grants.is_empty() {
                mailbox.acls.push(grant);
            }
        }
    }

    pub fn set_identity(&self, account_id: AccountId, identity: Identity) {
        if let Some(account) = self.data.write().accounts.get_mut(&account_id) {
            account.identity = identity;
        }
    }

    pub fn set_quota_limits(
        &self,
        quota_root: &str,
        max_storage: Option<u64>,
        max_messages: Option<u64>,
    ) {
        let mut quotas = self.quotas.lock();
        let quota = quotas.entry(quota_root.to_string()).or_default();
        quota.max_storage = max_storage;
        quota.max_messages = max_messages;
    }

    pub fn add_blob(&self, blob_id: &str, contents: Vec<u8>) {
        self.data
            .write()
            .blobs
            .insert(blob_id.to_string(), Arc::new(contents));
    }

    /// Test seeding: appends and accounts quota in one step.
    pub fn seed_message(
        &self,
        account_id: AccountId,
        mailbox_ids: Vec<DocumentId>,
        raw: Vec<u8>,
        keywords: Vec<Keyword>,
        received_at: i64,
    ) -> MessageData {
        let message = self
            .append_locked(account_id, mailbox_ids, raw, keywords, received_at)
            .expect("unknown account");
        for root in self.quota_roots_of(account_id, &message.mailbox_ids) {
            let mut quotas = self.quotas.lock();
            quotas
                .entry(root)
                .or_default()
                .reserve(QuotaDelta::new(message.size, 1));
        }
        message
    }

    fn append_locked(
        &self,
        account_id: AccountId,
        mailbox_ids: Vec<DocumentId>,
        raw: Vec<u8>,
        keywords: Vec<Keyword>,
        received_at: i64,
    ) -> Result<MessageData> {
        let mut data = self.data.write();
        data.next_document_id += 1;
        let id = data.next_document_id;
        let account = data
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound)?;
        let key = thread_key(&raw);
        let thread_id = if key.is_empty() {
            id
        } else {
            *account.threads.entry(key).or_insert(id)
        };
        let message = MessageData {
            id,
            account_id,
            mailbox_ids,
            keywords,
            size: raw.len() as u64,
            received_at,
            thread_id,
            raw: Arc::new(raw),
        };
        account.messages.push(message.clone());
        Ok(message)
    }

    fn quota_roots_of(&self, account_id: AccountId, mailbox_ids: &[DocumentId]) -> Vec<String> {
        let data = self.data.read();
        let mut roots = Vec::new();
        if let Some(account) = data.accounts.get(&account_id) {
            for mailbox in account
                .mailboxes
                .iter()
                .filter(|m| mailbox_ids.contains(&m.id))
            {
                if !roots.contains(&mailbox.quota_root) {
                    roots.push(mailbox.quota_root.clone());
                }
            }
        }
        roots
    }
}

/// Threads are keyed on the normalized subject, enough for the engine's
/// collapse semantics without a real conversation index.
fn thread_key(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    for line in text.lines() {
        if line.is_empty() {
            break;
        }
        if let Some(value) = line
            .split_once(':')
            .filter(|(name, _)| name.eq_ignore_ascii_case("subject"))
            .map(|(_, value)| value)
        {
            let mut subject = value.trim();
            loop {
                let lower = subject.to_ascii_lowercase();
                if let Some(rest) = lower
                    .strip_prefix("re:")
                    .or_else(|| lower.strip_prefix("fwd:"))
                    .or_else(|| lower.strip_prefix("fw:"))
                {
                    subject = subject[subject.len() - rest.len()..].trim();
                } else {
                    break;
                }
            }
            return subject.to_ascii_lowercase();
        }
    }
    String::new()
}

#[async_trait::async_trait]
impl MailStore for MemoryStore {
    async fn list_accounts(&self) -> Result<Vec<AccountId>> {
        let mut ids = self.data.read().accounts.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn principal_name(&self, account_id: AccountId) -> Result<Option<String>> {
        Ok(self
            .data
            .read()
            .accounts
            .get(&account_id)
            .map(|account| account.name.clone()))
    }

    async fn identity(&self, account_id: AccountId) -> Result<Option<Identity>> {
        Ok(self
            .data
            .read()
            .accounts
            .get(&account_id)
            .map(|account| account.identity.clone()))
    }

    async fn list_mailboxes(&self, account_id: AccountId) -> Result<Vec<Mailbox>> {
        Ok(self
            .data
            .read()
            .accounts
            .get(&account_id)
            .map(|account| account.mailboxes.clone())
            .unwrap_or_default())
    }

    async fn get_mailbox(
        &self,
        account_id: AccountId,
        mailbox_id: DocumentId,
    ) -> Result<Option<Mailbox>> {
        Ok(self.data.read().accounts.get(&account_id).and_then(|account| {
            account
                .mailboxes
                .iter()
                .find(|m| m.id == mailbox_id)
                .cloned()
        }))
    }

    async fn mailbox_by_role(
        &self,
        account_id: AccountId,
        role: SpecialUse,
    ) -> Result<Option<Mailbox>> {
        Ok(self.data.read().accounts.get(&account_id).and_then(|account| {
            account
                .mailboxes
                .iter()
                .find(|m| m.role == role)
                .cloned()
        }))
    }

    async fn get_acl(
        &self,
        account_id: AccountId,
        mailbox_id: DocumentId,
    ) -> Result<Vec<AclGrant>> {
        Ok(self
            .get_mailbox(account_id, mailbox_id)
            .await?
            .map(|mailbox| mailbox.acls)
            .unwrap_or_default())
    }

    async fn list_messages(&self, account_id: AccountId) -> Result<Vec<MessageData>> {
        Ok(self
            .data
            .read()
            .accounts
            .get(&account_id)
            .map(|account| account.messages.clone())
            .unwrap_or_default())
    }

    async fn get_message(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
    ) -> Result<Option<MessageData>> {
        Ok(self.data.read().accounts.get(&account_id).and_then(|account| {
            account
                .messages
                .iter()
                .find(|m| m.id == message_id)
                .cloned()
        }))
    }

    async fn append_message(
        &self,
        account_id: AccountId,
        mailbox_ids: Vec<DocumentId>,
        raw: Vec<u8>,
        keywords: Vec<Keyword>,
        received_at: i64,
    ) -> Result<MessageData> {
        self.append_locked(account_id, mailbox_ids, raw, keywords, received_at)
    }

    async fn set_keywords(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
        keywords: Vec<Keyword>,
    ) -> Result<()> {
        let mut data = self.data.write();
        let message = data
            .accounts
            .get_mut(&account_id)
            .and_then(|account| account.messages.iter_mut().find(|m| m.id == message_id))
            .ok_or(StoreError::NotFound)?;
        message.keywords = keywords;
        Ok(())
    }

    async fn move_message(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
        mailbox_ids: Vec<DocumentId>,
    ) -> Result<()> {
        let mut data = self.data.write();
        let message = data
            .accounts
            .get_mut(&account_id)
            .and_then(|account| account.messages.iter_mut().find(|m| m.id == message_id))
            .ok_or(StoreError::NotFound)?;
        message.mailbox_ids = mailbox_ids;
        Ok(())
    }

    async fn delete_message(&self, account_id: AccountId, message_id: DocumentId) -> Result<()> {
        let removed = {
            let mut data = self.data.write();
            let account = data
                .accounts
                .get_mut(&account_id)
                .ok_or(StoreError::NotFound)?;
            let pos = account
                .messages
                .iter()
                .position(|m| m.id == message_id)
                .ok_or(StoreError::NotFound)?;
            account.messages.remove(pos)
        };

        for root in self.quota_roots_of(account_id, &removed.mailbox_ids) {
            let mut quotas = self.quotas.lock();
            quotas
                .entry(root)
                .or_default()
                .release(QuotaDelta::new(removed.size, 1));
        }
        Ok(())
    }

    async fn get_quota(&self, quota_root: &str) -> Result<Quota> {
        Ok(self
            .quotas
            .lock()
            .get(quota_root)
            .cloned()
            .unwrap_or_default())
    }

    async fn reserve_quota(&self, quota_root: &str, delta: QuotaDelta) -> Result<bool> {
        let mut quotas = self.quotas.lock();
        let quota = quotas.entry(quota_root.to_string()).or_default();
        if quota.fits(delta) {
            quota.reserve(delta);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release_quota(&self, quota_root: &str, delta: QuotaDelta) -> Result<()> {
        if let Some(quota) = self.quotas.lock().get_mut(quota_root) {
            quota.release(delta);
        }
        Ok(())
    }

    async fn resolve_attachment(&self, blob_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .data
            .read()
            .blobs
            .get(blob_id)
            .map(|blob| blob.as_ref().clone()))
    }
}

/// Delivery collaborator that records submissions; tests inspect the log
/// and the engine treats a successful submit as the local delivery ack.
#[derive(Default)]
pub struct MemoryDeliveryQueue {
    submitted: Mutex<Vec<Envelope>>,
    fail_next: Mutex<bool>,
}

impl MemoryDeliveryQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryDeliveryQueue::default())
    }

    pub fn submitted(&self) -> Vec<Envelope> {
        self.submitted.lock().clone()
    }

    pub fn fail_next_submission(&self) {
        *self.fail_next.lock() = true;
    }
}

#[async_trait::async_trait]
impl DeliveryQueue for MemoryDeliveryQueue {
    async fn submit_for_delivery(&self, envelope: Envelope) -> Result<()> {
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(StoreError::Internal("delivery refused".to_string()));
        }
        tracing::debug!(
            sender = envelope.sender.as_str(),
            recipients = envelope.recipients.len(),
            "message accepted for delivery"
        );
        self.submitted.lock().push(envelope);
        Ok(())
    }
}
