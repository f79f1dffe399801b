/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Engine, store_fail};
use jmap_proto::error::method::MethodError;
use store::{Mailbox, quota::QuotaDelta};

impl Engine {
    /// Distinct quota-roots behind a set of mailboxes; a message is
    /// accounted once per root however many of its mailboxes share it.
    pub(crate) fn quota_roots(mailboxes: &[&Mailbox]) -> Vec<String> {
        let mut roots = Vec::new();
        for mailbox in mailboxes {
            if !roots.contains(&mailbox.quota_root) {
                roots.push(mailbox.quota_root.clone());
            }
        }
        roots
    }

    /// Authorizes a size/count-affecting operation against every root it
    /// touches. Either all roots accept the delta or none retain it.
    pub(crate) async fn reserve_quota(
        &self,
        roots: &[String],
        delta: QuotaDelta,
    ) -> Result<bool, MethodError> {
        let mut reserved: Vec<&String> = Vec::with_capacity(roots.len());
        for root in roots {
            if self
                .store
                .reserve_quota(root, delta)
                .await
                .map_err(store_fail)?
            {
                reserved.push(root);
            } else {
                tracing::debug!(quota_root = root.as_str(), "quota exceeded");
                for root in reserved {
                    self.store
                        .release_quota(root, delta)
                        .await
                        .map_err(store_fail)?;
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) async fn release_quota(
        &self,
        roots: &[String],
        delta: QuotaDelta,
    ) -> Result<(), MethodError> {
        for root in roots {
            self.store
                .release_quota(root, delta)
                .await
                .map_err(store_fail)?;
        }
        Ok(())
    }
}
