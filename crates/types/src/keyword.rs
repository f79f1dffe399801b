/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Seen,
    Draft,
    Flagged,
    Answered,
    Recent,
    Deleted,
    Forwarded,
    MdnSent,
    Other(Box<str>),
}

impl Keyword {
    pub const MAX_LENGTH: usize = 128;

    pub fn parse(value: &str) -> Self {
        Self::try_parse(value)
            .unwrap_or_else(|| Keyword::Other(value.chars().take(Keyword::MAX_LENGTH).collect()))
    }

    pub fn try_parse(value: &str) -> Option<Self> {
        value
            .split_at_checked(1)
            .filter(|(prefix, _)| matches!(*prefix, "$" | "\\"))
            .and_then(|(_, rest)| {
                hashify::tiny_map_ignore_case!(rest.as_bytes(),
                    "seen" => Keyword::Seen,
                    "draft" => Keyword::Draft,
                    "flagged" => Keyword::Flagged,
                    "answered" => Keyword::Answered,
                    "recent" => Keyword::Recent,
                    "deleted" => Keyword::Deleted,
                    "forwarded" => Keyword::Forwarded,
                    "mdnsent" => Keyword::MdnSent,
                )
            })
    }

    /// `$Deleted` and `$Recent` mirror IMAP session state and are never
    /// settable through the mutation API.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Keyword::Deleted | Keyword::Recent)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Keyword::Seen => "$Seen",
            Keyword::Draft => "$Draft",
            Keyword::Flagged => "$Flagged",
            Keyword::Answered => "$Answered",
            Keyword::Recent => "$Recent",
            Keyword::Deleted => "$Deleted",
            Keyword::Forwarded => "$Forwarded",
            Keyword::MdnSent => "$MDNSent",
            Keyword::Other(s) => s.as_ref(),
        }
    }
}

impl From<String> for Keyword {
    fn from(value: String) -> Self {
        Keyword::try_parse(&value).unwrap_or_else(|| {
            if value.len() <= Keyword::MAX_LENGTH {
                Keyword::Other(value.into_boxed_str())
            } else {
                Keyword::Other(value.chars().take(Keyword::MAX_LENGTH).collect())
            }
        })
    }
}

impl From<&str> for Keyword {
    fn from(value: &str) -> Self {
        Keyword::parse(value)
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Keyword::parse(s))
    }
}

impl serde::Serialize for Keyword {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Keyword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Keyword::parse(<&str>::deserialize(deserializer)?))
    }
}
