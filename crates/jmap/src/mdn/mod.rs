/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{AccessToken, Engine};
use jmap_proto::{
    error::{method::MethodError, set::SetError},
    method::send_mdn::{
        ActionMode, Disposition, DispositionType, MdnObject, SendingMode,
    },
};
use mail_builder::{
    MessageBuilder,
    headers::{HeaderType, address::Address, content_type::ContentType},
    mime::{BodyPart, MimePart},
};
use mail_parser::MessageParser;
use store::quota::QuotaDelta;
use types::{id::Id, special_use::SpecialUse};

/// Correlates a composed MDN with the origin message it acknowledges.
pub const MDN_ORIGIN_HEADER: &str = "X-JMAP-MDN-Origin-Message-Id";

/// A `sendMDN` item whose shape passed validation. Missing mandatory
/// fields fail the whole call naming the field; only origin-message
/// problems degrade to per-item errors.
#[derive(Debug, Clone)]
pub struct ValidMdn {
    pub message_id: Id,
    pub subject: String,
    pub text_body: String,
    pub reporting_ua: String,
    pub disposition: Disposition,
}

impl ValidMdn {
    pub fn try_from_object(object: &MdnObject) -> Result<Self, MethodError> {
        let disposition = object.disposition.as_ref().ok_or_else(|| mandatory("disposition"))?;
        Ok(ValidMdn {
            message_id: object.message_id.ok_or_else(|| mandatory("messageId"))?,
            subject: object
                .subject
                .clone()
                .ok_or_else(|| mandatory("subject"))?,
            text_body: object
                .text_body
                .clone()
                .ok_or_else(|| mandatory("textBody"))?,
            reporting_ua: object
                .reporting_ua
                .clone()
                .ok_or_else(|| mandatory("reportingUA"))?,
            disposition: Disposition {
                action_mode: ActionMode::parse(
                    disposition
                        .action_mode
                        .as_deref()
                        .ok_or_else(|| mandatory("actionMode"))?,
                )
                .map_err(|err| MethodError::invalid_arguments(err.0))?,
                sending_mode: SendingMode::parse(
                    disposition
                        .sending_mode
                        .as_deref()
                        .ok_or_else(|| mandatory("sendingMode"))?,
                )
                .map_err(|err| MethodError::invalid_arguments(err.0))?,
                type_: DispositionType::parse(
                    disposition
                        .type_
                        .as_deref()
                        .ok_or_else(|| mandatory("type"))?,
                )
                .map_err(|err| MethodError::invalid_arguments(err.0))?,
            },
        })
    }
}

fn mandatory(field: &str) -> MethodError {
    MethodError::invalid_arguments(format!("problem: '{field}' is mandatory"))
}

impl Engine {
    /// Builds the disposition notification for an origin message and
    /// routes it through the ordinary create-in-Outbox path, inheriting
    /// its quota and submission semantics.
    pub(crate) async fn send_validated_mdn(
        &self,
        mdn: &ValidMdn,
        access_token: &AccessToken,
    ) -> Result<Id, SetError> {
        let account_id = access_token.primary_id();
        let origin = self
            .store
            .get_message(account_id, mdn.message_id.document_id())
            .await
            .map_err(|err| SetError::an_error_occurred().with_description(err.to_string()))?
            .ok_or_else(|| {
                SetError::invalid_arguments().with_description(format!(
                    "Message with id {} not found. Thus could not send MDN.",
                    mdn.message_id
                ))
            })?;

        let parsed = MessageParser::default().parse(origin.raw.as_slice());
        let notify_to = parsed
            .as_ref()
            .and_then(|message| {
                message.headers().iter().find_map(|header| {
                    if header
                        .name
                        .as_str()
                        .eq_ignore_ascii_case("Disposition-Notification-To")
                    {
                        header.value.as_text().map(|text| text.to_string()).or_else(|| {
                            let mut out = String::new();
                            crate::email::filter::visit_header_text(&header.value, &mut out);
                            let out = out.trim().to_string();
                            (!out.is_empty()).then_some(out)
                        })
                    } else {
                        None
                    }
                })
            })
            .ok_or_else(|| {
                SetError::invalid_arguments().with_description(format!(
                    "Origin messageId '{}' is invalid. A Message Delivery Notification \
                     can not be generated for it. Explanation: \
                     Disposition-Notification-To header is missing",
                    mdn.message_id
                ))
            })?;

        let identity = self
            .store
            .identity(account_id)
            .await
            .map_err(|err| SetError::an_error_occurred().with_description(err.to_string()))?
            .unwrap_or_default();
        let original_message_id = parsed.as_ref().and_then(|message| {
            message.headers().iter().find_map(|header| {
                if header.name.as_str().eq_ignore_ascii_case("Message-ID") {
                    header.value.as_text().map(|text| text.to_string())
                } else {
                    None
                }
            })
        });

        let raw = compose(mdn, &identity.email, &notify_to, original_message_id.as_deref())
            .map_err(|_| {
                SetError::an_error_occurred().with_description("Could not assemble the MDN")
            })?;

        let outbox = self
            .store
            .mailbox_by_role(account_id, SpecialUse::Outbox)
            .await
            .map_err(|err| SetError::an_error_occurred().with_description(err.to_string()))?
            .ok_or_else(|| {
                SetError::an_error_occurred()
                    .with_description("No mailbox with role Outbox is provisioned")
            })?;

        let quota_roots = vec![outbox.quota_root.clone()];
        let delta = QuotaDelta::new(raw.len() as u64, 1);
        if !self
            .reserve_quota(&quota_roots, delta)
            .await
            .map_err(|err| SetError::an_error_occurred().with_description(err.to_string()))?
        {
            return Err(SetError::max_quota_reached().with_description("Max quota reached"));
        }

        let message = match self
            .store
            .append_message(
                account_id,
                vec![outbox.id],
                raw,
                Vec::new(),
                chrono::Utc::now().timestamp(),
            )
            .await
        {
            Ok(message) => message,
            Err(err) => {
                let _ = self.release_quota(&quota_roots, delta).await;
                return Err(SetError::an_error_occurred().with_description(err.to_string()));
            }
        };

        tracing::debug!(
            account_id,
            message_id = message.id,
            origin_id = %mdn.message_id,
            "MDN placed in Outbox"
        );
        self.spawn_submission(account_id, message.id);

        Ok(Id::from(message.id))
    }
}

fn compose(
    mdn: &ValidMdn,
    final_recipient: &str,
    notify_to: &str,
    original_message_id: Option<&str>,
) -> std::io::Result<Vec<u8>> {
    let mut report = String::with_capacity(256);
    report.push_str("Reporting-UA: ");
    report.push_str(&mdn.reporting_ua);
    report.push_str("\r\nFinal-Recipient: rfc822; ");
    report.push_str(final_recipient);
    if let Some(original) = original_message_id {
        report.push_str("\r\nOriginal-Message-ID: ");
        report.push_str(original);
    }
    report.push_str("\r\nDisposition: ");
    report.push_str(&mdn.disposition.as_field());
    report.push_str("\r\n");

    MessageBuilder::new()
        .from(Address::new_address(None::<&str>, final_recipient))
        .header("To", HeaderType::Text(notify_to.into()))
        .header(
            MDN_ORIGIN_HEADER,
            HeaderType::Text(mdn.message_id.to_string().into()),
        )
        .subject(mdn.subject.as_str())
        .body(MimePart::new(
            ContentType::new("multipart/report").attribute("report-type", "disposition-notification"),
            BodyPart::Multipart(vec![
                MimePart::new(
                    ContentType::new("text/plain"),
                    BodyPart::Text(mdn.text_body.as_str().into()),
                ),
                MimePart::new(
                    ContentType::new("message/disposition-notification"),
                    BodyPart::Text(report.into()),
                ),
            ]),
        ))
        .write_to_vec()
}
