/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Date,
    Id,
    Subject,
    From,
    To,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    pub property: SortProperty,
    pub is_ascending: bool,
}

impl Comparator {
    pub fn ascending(property: SortProperty) -> Self {
        Comparator {
            property,
            is_ascending: true,
        }
    }

    pub fn descending(property: SortProperty) -> Self {
        Comparator {
            property,
            is_ascending: false,
        }
    }

    /// Parses the draft dialect's `"<field>"` / `"<field> asc|desc"` sort
    /// key form. A bare field sorts descending.
    pub fn parse(value: &str) -> Result<Self, SortError> {
        let mut parts = value.split_whitespace();
        let field = parts.next().unwrap_or_default();
        let property = match field {
            "date" => SortProperty::Date,
            "id" => SortProperty::Id,
            "subject" => SortProperty::Subject,
            "from" => SortProperty::From,
            "to" => SortProperty::To,
            "size" => SortProperty::Size,
            _ => return Err(SortError::UnknownField(field.to_string())),
        };
        let is_ascending = match parts.next() {
            None => false,
            Some("asc") => true,
            Some("desc") => false,
            Some(order) => return Err(SortError::UnknownOrder(order.to_string())),
        };
        if parts.next().is_some() {
            return Err(SortError::UnknownOrder(value.to_string()));
        }
        Ok(Comparator {
            property,
            is_ascending,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    UnknownField(String),
    UnknownOrder(String),
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::UnknownField(field) => write!(f, "Unknown sort field '{field}'"),
            SortError::UnknownOrder(order) => write!(f, "Unknown sort order '{order}'"),
        }
    }
}

impl std::error::Error for SortError {}

impl<'de> serde::Deserialize<'de> for Comparator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Comparator::parse(<&str>::deserialize(deserializer)?)
            .map_err(serde::de::Error::custom)
    }
}
