/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use jmap_proto::filter::{Filter, FilterCondition, Operator};
use mail_parser::{Address, HeaderValue, Message, MimeHeaders};
use store::MessageData;
use types::keyword::Keyword;

/// Evaluates a validated filter tree against one message. Pure and total:
/// a message that fails to parse simply has no header/body content to
/// match on.
pub fn matches(filter: &Filter, data: &MessageData, parsed: Option<&Message<'_>>) -> bool {
    match filter {
        Filter::Operator(operator) => {
            let mut children = operator.conditions.iter();
            match operator.operator {
                Operator::And => children.all(|child| matches(child, data, parsed)),
                Operator::Or => children.any(|child| matches(child, data, parsed)),
                // NOT is none-of: every child has to fail.
                Operator::Not => !children.any(|child| matches(child, data, parsed)),
            }
        }
        Filter::Condition(condition) => matches_condition(condition, data, parsed),
    }
}

fn matches_condition(
    condition: &FilterCondition,
    data: &MessageData,
    parsed: Option<&Message<'_>>,
) -> bool {
    if let Some(mailbox_ids) = &condition.in_mailboxes {
        if !mailbox_ids
            .iter()
            .any(|id| data.in_mailbox(id.document_id()))
        {
            return false;
        }
    }
    // When combined with `inMailboxes`, exclusion wins on the
    // intersection.
    if let Some(mailbox_ids) = &condition.not_in_mailboxes {
        if mailbox_ids
            .iter()
            .any(|id| data.in_mailbox(id.document_id()))
        {
            return false;
        }
    }

    if let Some(before) = &condition.before {
        if data.received_at >= before.timestamp() {
            return false;
        }
    }
    if let Some(after) = &condition.after {
        if data.received_at <= after.timestamp() {
            return false;
        }
    }
    if let Some(min_size) = condition.min_size {
        if data.size < min_size {
            return false;
        }
    }
    if let Some(max_size) = condition.max_size {
        if data.size >= max_size {
            return false;
        }
    }

    if let Some(is_flagged) = condition.is_flagged {
        if data.has_keyword(&Keyword::Flagged) != is_flagged {
            return false;
        }
    }
    if let Some(is_unread) = condition.is_unread {
        if data.has_keyword(&Keyword::Seen) == is_unread {
            return false;
        }
    }
    if let Some(is_answered) = condition.is_answered {
        if data.has_keyword(&Keyword::Answered) != is_answered {
            return false;
        }
    }
    if let Some(is_draft) = condition.is_draft {
        if data.has_keyword(&Keyword::Draft) != is_draft {
            return false;
        }
    }
    if let Some(is_forwarded) = condition.is_forwarded {
        if data.has_keyword(&Keyword::Forwarded) != is_forwarded {
            return false;
        }
    }

    // The transient $Recent keyword never includes or excludes anything.
    if let Some(keyword) = &condition.has_keyword {
        let keyword = Keyword::parse(keyword);
        if keyword != Keyword::Recent && !data.has_keyword(&keyword) {
            return false;
        }
    }
    if let Some(keyword) = &condition.not_keyword {
        let keyword = Keyword::parse(keyword);
        if keyword != Keyword::Recent && data.has_keyword(&keyword) {
            return false;
        }
    }

    if let Some(has_attachment) = condition.has_attachment {
        let attachment_count = parsed.map_or(0, |m| m.attachment_count());
        if (attachment_count > 0) != has_attachment {
            return false;
        }
    }

    if let Some(needle) = &condition.text {
        let mut haystack = String::new();
        if let Some(message) = parsed {
            for name in ["from", "to", "cc", "bcc", "subject"] {
                header_text(message, name, &mut haystack);
            }
            body_text(message, &mut haystack);
            attachment_text(message, &mut haystack);
        }
        if !contains_ignore_case(&haystack, needle) {
            return false;
        }
    }

    for (field, needle) in [
        ("from", &condition.from),
        ("to", &condition.to),
        ("cc", &condition.cc),
        ("bcc", &condition.bcc),
        ("subject", &condition.subject),
    ] {
        if let Some(needle) = needle {
            let mut haystack = String::new();
            if let Some(message) = parsed {
                header_text(message, field, &mut haystack);
            }
            if !contains_ignore_case(&haystack, needle) {
                return false;
            }
        }
    }

    if let Some(needle) = &condition.body {
        let mut haystack = String::new();
        if let Some(message) = parsed {
            body_text(message, &mut haystack);
        }
        if !contains_ignore_case(&haystack, needle) {
            return false;
        }
    }

    if let Some(needle) = &condition.attachments {
        let mut haystack = String::new();
        if let Some(message) = parsed {
            attachment_text(message, &mut haystack);
        }
        if !contains_ignore_case(&haystack, needle) {
            return false;
        }
    }

    // Declared attachment names only, never content.
    if let Some(needle) = &condition.attachment_file_name {
        let mut haystack = String::new();
        if let Some(message) = parsed {
            for attachment in message.attachments() {
                if let Some(name) = attachment.attachment_name() {
                    haystack.push_str(name);
                    haystack.push('\n');
                }
            }
        }
        if !contains_ignore_case(&haystack, needle) {
            return false;
        }
    }

    if let Some(header) = &condition.header {
        let name = header.first().map(String::as_str).unwrap_or_default();
        let mut haystack = String::new();
        let mut present = false;
        if let Some(message) = parsed {
            for hdr in message.headers() {
                if hdr.name.as_str().eq_ignore_ascii_case(name) {
                    present = true;
                    visit_header_text(&hdr.value, &mut haystack);
                }
            }
        }
        match header.get(1) {
            Some(value) => {
                if !contains_ignore_case(&haystack, value) {
                    return false;
                }
            }
            None => {
                if !present {
                    return false;
                }
            }
        }
    }

    true
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

fn header_text(message: &Message<'_>, name: &str, out: &mut String) {
    for header in message.headers() {
        if header.name.as_str().eq_ignore_ascii_case(name) {
            visit_header_text(&header.value, out);
        }
    }
}

pub(crate) fn visit_header_text(value: &HeaderValue<'_>, out: &mut String) {
    match value {
        HeaderValue::Address(Address::List(list)) => {
            for addr in list {
                if let Some(name) = &addr.name {
                    out.push_str(name);
                    out.push(' ');
                }
                if let Some(address) = &addr.address {
                    out.push_str(address);
                    out.push('\n');
                }
            }
        }
        HeaderValue::Address(Address::Group(groups)) => {
            for group in groups {
                if let Some(name) = &group.name {
                    out.push_str(name);
                    out.push(' ');
                }
                for addr in &group.addresses {
                    if let Some(name) = &addr.name {
                        out.push_str(name);
                        out.push(' ');
                    }
                    if let Some(address) = &addr.address {
                        out.push_str(address);
                        out.push('\n');
                    }
                }
            }
        }
        HeaderValue::Text(text) => {
            out.push_str(text);
            out.push('\n');
        }
        HeaderValue::TextList(texts) => {
            for text in texts {
                out.push_str(text);
                out.push('\n');
            }
        }
        _ => (),
    }
}

fn body_text(message: &Message<'_>, out: &mut String) {
    for idx in 0..message.text_body_count() {
        if let Some(text) = message.body_text(idx) {
            out.push_str(&text);
            out.push('\n');
        }
    }
    for idx in 0..message.html_body_count() {
        if let Some(html) = message.body_html(idx) {
            out.push_str(&html);
            out.push('\n');
        }
    }
}

fn attachment_text(message: &Message<'_>, out: &mut String) {
    for attachment in message.attachments() {
        if let Some(name) = attachment.attachment_name() {
            out.push_str(name);
            out.push('\n');
        }
        if let Some(text) = attachment.text_contents() {
            out.push_str(text);
            out.push('\n');
        }
    }
}
