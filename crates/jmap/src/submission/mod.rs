/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use mail_parser::{Address, HeaderValue, Message, MessageParser};
use store::Envelope;
use types::{AccountId, DocumentId, keyword::Keyword, special_use::SpecialUse};

use crate::Engine;

impl Engine {
    /// Fires the Outbox submission side-effect. The caller's mutation has
    /// already returned by the time delivery and relocation run; callers
    /// observe completion by polling the Sent mailbox.
    pub(crate) fn spawn_submission(&self, account_id: AccountId, message_id: DocumentId) {
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(err) = engine.process_submission(account_id, message_id).await {
                tracing::error!(
                    account_id,
                    message_id,
                    reason = %err,
                    "message submission failed"
                );
            }
        });
    }

    async fn process_submission(
        &self,
        account_id: AccountId,
        message_id: DocumentId,
    ) -> store::Result<()> {
        let Some(message) = self.store.get_message(account_id, message_id).await? else {
            return Ok(());
        };
        let identity = self.store.identity(account_id).await?.unwrap_or_default();

        let (sender, recipients) = {
            let parsed = MessageParser::default().parse(message.raw.as_slice());
            let sender = parsed
                .as_ref()
                .and_then(|m| first_address_of(m, "from"))
                .unwrap_or(identity.email);
            let mut recipients = Vec::new();
            if let Some(parsed) = &parsed {
                for field in ["to", "cc", "bcc"] {
                    collect_addresses(parsed, field, &mut recipients);
                }
            }
            (sender, recipients)
        };

        self.delivery
            .submit_for_delivery(Envelope {
                sender,
                recipients,
                raw: message.raw.clone(),
            })
            .await?;

        // Local delivery acknowledged: file into Sent with the Seen flag,
        // drop the draft marker and the transient Outbox membership.
        let Some(sent) = self
            .store
            .mailbox_by_role(account_id, SpecialUse::Sent)
            .await?
        else {
            return Ok(());
        };

        let mut keywords = message.keywords.clone();
        keywords.retain(|keyword| keyword != &Keyword::Draft);
        if !keywords.contains(&Keyword::Seen) {
            keywords.push(Keyword::Seen);
        }
        self.store
            .set_keywords(account_id, message_id, keywords)
            .await?;
        self.store
            .move_message(account_id, message_id, vec![sent.id])
            .await?;
        tracing::debug!(account_id, message_id, "message filed into Sent");

        Ok(())
    }
}

fn first_address_of(message: &Message<'_>, field: &str) -> Option<String> {
    let mut addresses = Vec::new();
    collect_addresses(message, field, &mut addresses);
    addresses.into_iter().next()
}

fn collect_addresses(message: &Message<'_>, field: &str, out: &mut Vec<String>) {
    for header in message.headers() {
        if !header.name.as_str().eq_ignore_ascii_case(field) {
            continue;
        }
        match &header.value {
            HeaderValue::Address(Address::List(list)) => {
                out.extend(list.iter().filter_map(|addr| {
                    addr.address.as_ref().map(|address| address.to_string())
                }));
            }
            HeaderValue::Address(Address::Group(groups)) => {
                for group in groups {
                    out.extend(group.addresses.iter().filter_map(|addr| {
                        addr.address.as_ref().map(|address| address.to_string())
                    }));
                }
            }
            _ => (),
        }
    }
}
