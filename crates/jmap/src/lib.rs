/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod api;
pub mod email;
pub mod mailbox;
pub mod mdn;
pub mod quota;
pub mod submission;

use jmap_proto::error::method::MethodError;
use std::sync::Arc;
use store::{DeliveryQueue, MailStore, StoreError};
use types::AccountId;

#[derive(Debug, Clone)]
pub struct JmapConfig {
    /// Upper bound on results returned by a query when the client does not
    /// supply a `limit`.
    pub query_max_results: usize,
    /// Ceiling on the assembled size of a created message, in bytes.
    pub max_size_message: usize,
    /// Maximum number of create/update/destroy items accepted in one call.
    pub max_objects_in_set: usize,
}

impl Default for JmapConfig {
    fn default() -> Self {
        JmapConfig {
            query_max_results: 256,
            max_size_message: 10 * 1024 * 1024,
            max_objects_in_set: 128,
        }
    }
}

/// The query/mutation engine. Holds no message state of its own; every
/// intent goes through the storage and delivery collaborators.
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<dyn MailStore>,
    pub delivery: Arc<dyn DeliveryQueue>,
    pub config: JmapConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn MailStore>, delivery: Arc<dyn DeliveryQueue>) -> Self {
        Engine {
            store,
            delivery,
            config: JmapConfig::default(),
        }
    }

    pub fn with_config(mut self, config: JmapConfig) -> Self {
        self.config = config;
        self
    }
}

/// Authenticated viewer on whose behalf a request is evaluated.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub primary_id: AccountId,
    pub name: String,
    pub member_of: Vec<AccountId>,
}

impl AccessToken {
    pub fn new(primary_id: AccountId, name: impl Into<String>) -> Self {
        AccessToken {
            primary_id,
            name: name.into(),
            member_of: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn primary_id(&self) -> AccountId {
        self.primary_id
    }

    pub fn is_member(&self, account_id: AccountId) -> bool {
        account_id == self.primary_id || self.member_of.contains(&account_id)
    }

    pub fn is_shared(&self, account_id: AccountId) -> bool {
        !self.is_member(account_id)
    }
}

pub(crate) fn store_fail(err: StoreError) -> MethodError {
    tracing::error!(reason = %err, "storage failure");
    MethodError::server_fail(err.to_string())
}
