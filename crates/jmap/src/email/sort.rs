/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use jmap_proto::sort::{Comparator, SortProperty};
use mail_parser::{Address, HeaderValue, Message};
use std::cmp::Ordering;
use store::MessageData;
use types::DocumentId;

/// Scalar keys extracted once per message before ordering.
#[derive(Debug, Clone)]
pub(crate) struct SortKeys {
    pub id: DocumentId,
    pub size: u64,
    pub received_at: i64,
    /// The parsed `Date` header when present and parseable, otherwise the
    /// internal date.
    pub sent_at: i64,
    pub subject: String,
    pub from: String,
    pub to: String,
}

impl SortKeys {
    pub fn build(data: &MessageData, parsed: Option<&Message<'_>>) -> Self {
        SortKeys {
            id: data.id,
            size: data.size,
            received_at: data.received_at,
            sent_at: parsed
                .and_then(|m| m.date())
                .map(|date| date.to_timestamp())
                .unwrap_or(data.received_at),
            subject: parsed
                .and_then(|m| m.subject())
                .unwrap_or_default()
                .to_lowercase(),
            from: parsed
                .and_then(|m| first_address(m, "from"))
                .unwrap_or_default(),
            to: parsed
                .and_then(|m| first_address(m, "to"))
                .unwrap_or_default(),
        }
    }
}

/// Applies each key in order; the first non-equal result wins. Ties left
/// by every key break on internal date, then identifier, so the order is
/// total and deterministic.
pub(crate) fn compare(a: &SortKeys, b: &SortKeys, comparators: &[Comparator]) -> Ordering {
    for comparator in comparators {
        let ordering = match comparator.property {
            SortProperty::Date => a.sent_at.cmp(&b.sent_at),
            SortProperty::Id => a.id.cmp(&b.id),
            SortProperty::Subject => a.subject.cmp(&b.subject),
            SortProperty::From => a.from.cmp(&b.from),
            SortProperty::To => a.to.cmp(&b.to),
            SortProperty::Size => a.size.cmp(&b.size),
        };
        let ordering = if comparator.is_ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a.received_at
        .cmp(&b.received_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn first_address(message: &Message<'_>, name: &str) -> Option<String> {
    message.headers().iter().find_map(|header| {
        if !header.name.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        match &header.value {
            HeaderValue::Address(Address::List(list)) => list.first().map(|addr| {
                addr.address
                    .as_deref()
                    .or(addr.name.as_deref())
                    .unwrap_or_default()
                    .to_lowercase()
            }),
            HeaderValue::Address(Address::Group(groups)) => groups
                .first()
                .and_then(|group| group.addresses.first())
                .map(|addr| {
                    addr.address
                        .as_deref()
                        .or(addr.name.as_deref())
                        .unwrap_or_default()
                        .to_lowercase()
                }),
            _ => None,
        }
    })
}
