/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum SpecialUse {
    Inbox,
    Archive,
    Drafts,
    Outbox,
    Sent,
    Trash,
    Spam,
    Templates,
    None,
}

impl SpecialUse {
    pub fn parse(s: &str) -> Option<Self> {
        hashify::tiny_map_ignore_case!(s.as_bytes(),
            b"inbox" => SpecialUse::Inbox,
            b"archive" => SpecialUse::Archive,
            b"drafts" => SpecialUse::Drafts,
            b"outbox" => SpecialUse::Outbox,
            b"sent" => SpecialUse::Sent,
            b"trash" => SpecialUse::Trash,
            b"spam" => SpecialUse::Spam,
            b"templates" => SpecialUse::Templates,
        )
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            SpecialUse::Inbox => Some("inbox"),
            SpecialUse::Archive => Some("archive"),
            SpecialUse::Drafts => Some("drafts"),
            SpecialUse::Outbox => Some("outbox"),
            SpecialUse::Sent => Some("sent"),
            SpecialUse::Trash => Some("trash"),
            SpecialUse::Spam => Some("spam"),
            SpecialUse::Templates => Some("templates"),
            SpecialUse::None => None,
        }
    }

    /// Default `sortOrder` assigned to a mailbox holding this role.
    pub fn default_sort_order(&self) -> u32 {
        match self {
            SpecialUse::Inbox => 10,
            SpecialUse::Archive => 20,
            SpecialUse::Drafts => 30,
            SpecialUse::Outbox => 40,
            SpecialUse::Sent => 50,
            SpecialUse::Trash => 60,
            SpecialUse::Spam => 70,
            SpecialUse::Templates => 80,
            SpecialUse::None => 1000,
        }
    }
}

impl serde::Serialize for SpecialUse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.as_str() {
            Some(role) => serializer.serialize_str(role),
            None => serializer.serialize_none(),
        }
    }
}
