/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::AccountId;
use std::fmt::{self, Display};
use utils::map::bitmap::{Bitmap, BitmapItem};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[repr(u8)]
pub enum Acl {
    Administer = 0,
    Expunge = 1,
    Insert = 2,
    CreateMailbox = 3,
    Lookup = 4,
    Post = 5,
    Read = 6,
    DeleteMessages = 7,
    Write = 8,
    DeleteMailbox = 9,
    None = 10,
}

/// Rights granted to one principal on a mailbox. A principal's effective
/// right-set is the union of its grants across all ACL entries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Default)]
pub struct AclGrant {
    pub account_id: AccountId,
    pub grants: Bitmap<Acl>,
}

impl Acl {
    /// Rights surfaced in the `sharedWith` projection, in canonical
    /// response order. All other rights are ignored for that projection.
    pub const SHARED_WITH: [Acl; 3] = [Acl::Administer, Acl::Lookup, Acl::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Administer => "Administer",
            Acl::Expunge => "Expunge",
            Acl::Insert => "Insert",
            Acl::CreateMailbox => "CreateMailbox",
            Acl::Lookup => "Lookup",
            Acl::Post => "Post",
            Acl::Read => "Read",
            Acl::DeleteMessages => "DeleteMessages",
            Acl::Write => "Write",
            Acl::DeleteMailbox => "DeleteMailbox",
            Acl::None => "",
        }
    }
}

impl Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Acl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl BitmapItem for Acl {
    fn max() -> u64 {
        Acl::None as u64
    }

    fn is_valid(&self) -> bool {
        !matches!(self, Acl::None)
    }
}

impl From<Acl> for u64 {
    fn from(value: Acl) -> Self {
        value as u64
    }
}

impl From<u64> for Acl {
    fn from(value: u64) -> Self {
        match value {
            0 => Acl::Administer,
            1 => Acl::Expunge,
            2 => Acl::Insert,
            3 => Acl::CreateMailbox,
            4 => Acl::Lookup,
            5 => Acl::Post,
            6 => Acl::Read,
            7 => Acl::DeleteMessages,
            8 => Acl::Write,
            9 => Acl::DeleteMailbox,
            _ => Acl::None,
        }
    }
}

impl AclGrant {
    pub fn new(account_id: AccountId, grants: impl IntoIterator<Item = Acl>) -> Self {
        AclGrant {
            account_id,
            grants: Bitmap::from_iter(grants),
        }
    }
}
