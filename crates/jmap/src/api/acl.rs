/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{AccessToken, Engine, store_fail};
use jmap_proto::{
    error::method::MethodError,
    method::get_mailboxes::MailboxNamespace,
};
use store::Mailbox;
use types::acl::{Acl, AclGrant};
use utils::map::{bitmap::Bitmap, vec_map::VecMap};

/// Union of all grants a viewer holds on an object, directly or through
/// group membership.
pub trait EffectiveAcl {
    fn effective_acl(&self, access_token: &AccessToken) -> Bitmap<Acl>;
}

impl EffectiveAcl for [AclGrant] {
    fn effective_acl(&self, access_token: &AccessToken) -> Bitmap<Acl> {
        let mut acl = Bitmap::new();
        for grant in self {
            if access_token.is_member(grant.account_id) {
                acl.union(&grant.grants);
            }
        }
        acl
    }
}

/// Boolean capability set projected into a mailbox response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxRights {
    pub may_read_items: bool,
    pub may_add_items: bool,
    pub may_remove_items: bool,
    pub may_create_child: bool,
    pub may_rename: bool,
    pub may_delete: bool,
}

impl MailboxRights {
    /// Owners hold every capability; for anyone else each capability maps
    /// onto one underlying right.
    pub fn owner() -> Self {
        MailboxRights {
            may_read_items: true,
            may_add_items: true,
            may_remove_items: true,
            may_create_child: true,
            may_rename: true,
            may_delete: true,
        }
    }

    pub fn shared(acl: Bitmap<Acl>) -> Self {
        MailboxRights {
            may_read_items: acl.contains(Acl::Read),
            may_add_items: acl.contains(Acl::Insert),
            may_remove_items: acl.contains(Acl::DeleteMessages),
            may_create_child: acl.contains(Acl::CreateMailbox),
            may_rename: acl.contains(Acl::Write),
            may_delete: acl.contains(Acl::DeleteMailbox),
        }
    }
}

impl Engine {
    /// Projects a mailbox's ACL into the `sharedWith` map. Owners are never
    /// listed, and the map is only disclosed to viewers holding Administer
    /// (owners implicitly do).
    pub(crate) async fn shared_with(
        &self,
        mailbox: &Mailbox,
        access_token: &AccessToken,
    ) -> Result<VecMap<String, Vec<&'static str>>, MethodError> {
        let mut shared_with = VecMap::new();
        let is_owner = access_token.is_member(mailbox.account_id);
        if !is_owner
            && !mailbox
                .acls
                .as_slice()
                .effective_acl(access_token)
                .contains(Acl::Administer)
        {
            return Ok(shared_with);
        }

        for grant in &mailbox.acls {
            if grant.account_id == mailbox.account_id {
                continue;
            }
            let rights = Acl::SHARED_WITH
                .iter()
                .filter(|right| grant.grants.contains(**right))
                .map(|right| right.as_str())
                .collect::<Vec<_>>();
            if rights.is_empty() {
                continue;
            }
            let principal = self
                .store
                .principal_name(grant.account_id)
                .await
                .map_err(store_fail)?
                .unwrap_or_else(|| grant.account_id.to_string());
            shared_with.append(principal, rights);
        }

        Ok(shared_with)
    }

    pub(crate) fn namespace(
        &self,
        mailbox: &Mailbox,
        owner_name: &str,
        access_token: &AccessToken,
    ) -> MailboxNamespace {
        if access_token.is_member(mailbox.account_id) {
            MailboxNamespace::personal()
        } else {
            MailboxNamespace::delegated(owner_name.to_string())
        }
    }
}
