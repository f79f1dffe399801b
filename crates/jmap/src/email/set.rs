/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{AccessToken, Engine, mdn::ValidMdn};
use jmap_proto::{
    error::{method::MethodError, set::SetError},
    method::set_messages::{
        Attachment, CreatedMessage, EmailAddress, MessageCreate, MessagePatch,
        SetMessagesRequest, SetMessagesResponse,
    },
};
use mail_builder::{
    MessageBuilder,
    headers::{HeaderType, address::Address},
};
use store::{Mailbox, StoreError, quota::QuotaDelta};
use types::{
    id::Id,
    keyword::Keyword,
    special_use::SpecialUse,
};
use utils::map::vec_map::VecMap;

impl Engine {
    pub async fn set_messages(
        &self,
        mut request: SetMessagesRequest,
        access_token: &AccessToken,
    ) -> Result<SetMessagesResponse, MethodError> {
        request.validate()?;

        let create = request.create.take().unwrap_or_default();
        let update = request.update.take().unwrap_or_default();
        let destroy = request.destroy.take().unwrap_or_default();
        let send_mdn = request.send_mdn.take().unwrap_or_default();
        if create.len() + update.len() + destroy.len() + send_mdn.len()
            > self.config.max_objects_in_set
        {
            return Err(MethodError::RequestTooLarge);
        }

        // Malformed MDN shapes fail the whole call before any per-item
        // processing starts.
        let mut valid_mdns = Vec::with_capacity(send_mdn.len());
        for (client_id, item) in send_mdn {
            valid_mdns.push((client_id, ValidMdn::try_from_object(&item)?));
        }

        let mut response = SetMessagesResponse::default();

        // Each item is processed independently; one failure never rolls
        // back its neighbors.
        for (creation_id, item) in create {
            match self.create_message(&item, access_token).await {
                Ok(id) => response.created(creation_id, id),
                Err(err) => response.not_created.append(creation_id, err),
            }
        }

        for (id, patch) in update {
            match self.update_message(id, &patch, access_token).await {
                Ok(()) => response.updated.push(id),
                Err(err) => response.not_updated.append(id, err),
            }
        }

        for id in destroy {
            match self.destroy_message(id, access_token).await {
                Ok(()) => response.destroyed.push(id),
                Err(err) => response.not_destroyed.append(id, err),
            }
        }

        for (client_id, mdn) in valid_mdns {
            match self.send_validated_mdn(&mdn, access_token).await {
                Ok(id) => response.mdn_sent.append(client_id, CreatedMessage { id }),
                Err(err) => response.mdn_not_sent.append(client_id, err),
            }
        }

        Ok(response)
    }

    async fn create_message(
        &self,
        create: &MessageCreate,
        access_token: &AccessToken,
    ) -> Result<Id, SetError> {
        let account_id = access_token.primary_id();
        let mailbox_ids = create
            .mailbox_ids
            .as_deref()
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| {
                SetError::invalid_properties()
                    .with_property("mailboxIds")
                    .with_description("Message needs to be in at least one mailbox")
            })?;

        if create.keywords.is_some() && create.has_flag_shorthand() {
            return Err(SetError::invalid_properties()
                .with_property("keywords")
                .with_description("Does not support keyword and is* at the same time"));
        }

        let keywords = match &create.keywords {
            Some(keywords) => keywords_from_map(keywords)?,
            None => {
                let mut keywords = Vec::new();
                if create.is_unread == Some(false) {
                    keywords.push(Keyword::Seen);
                }
                for (flag, keyword) in [
                    (create.is_flagged, Keyword::Flagged),
                    (create.is_answered, Keyword::Answered),
                    (create.is_draft, Keyword::Draft),
                    (create.is_forwarded, Keyword::Forwarded),
                ] {
                    if flag == Some(true) {
                        keywords.push(keyword);
                    }
                }
                keywords
            }
        };

        let mut mailboxes = Vec::with_capacity(mailbox_ids.len());
        for id in mailbox_ids {
            mailboxes.push(self.resolve_own_mailbox(account_id, *id).await?);
        }

        let is_draft_save = mailboxes
            .iter()
            .all(|mailbox| mailbox.role == SpecialUse::Drafts);
        let is_send = mailboxes
            .iter()
            .all(|mailbox| mailbox.role == SpecialUse::Outbox);
        if !is_draft_save && !is_send {
            return Err(SetError::invalid_properties()
                .with_property("mailboxIds")
                .with_description(
                    "Message creation is only supported in mailboxes with role Draft and Outbox",
                ));
        }

        let has_draft_keyword = keywords.contains(&Keyword::Draft);
        if is_draft_save && !has_draft_keyword {
            return Err(SetError::invalid_properties()
                .with_property("keywords")
                .with_description("A draft message should be flagged as Draft"));
        }

        let mut envelope_from = None;
        if is_send {
            if has_draft_keyword {
                return Err(SetError::invalid_properties()
                    .with_property("keywords")
                    .with_description(
                        "Message creation in Outbox is not supported for messages flagged as Draft",
                    ));
            }

            // Sending requires a verified originator and at least one
            // resolvable recipient; drafts tolerate both unset.
            let from = create
                .from
                .as_ref()
                .and_then(|address| address.email.as_deref())
                .ok_or_else(|| {
                    SetError::invalid_properties()
                        .with_property("from")
                        .with_description("'from' address is mandatory")
                })?;
            let identity = self
                .store
                .identity(account_id)
                .await
                .map_err(item_store_fail)?
                .unwrap_or_default();
            if !identity.may_send_as(from) {
                return Err(SetError::invalid_properties()
                    .with_property("from")
                    .with_description(format!(
                        "Invalid 'from' field. One accepted value is {}",
                        identity.email
                    )));
            }
            if recipient_addresses(create).next().is_none() {
                return Err(SetError::invalid_properties()
                    .with_property("to")
                    .with_description("no recipient address set"));
            }
            envelope_from = Some(from.to_string());
        }

        let mut attachments = Vec::new();
        let mut attachments_not_found = Vec::new();
        for attachment in create.attachments.as_deref().unwrap_or_default() {
            match self
                .store
                .resolve_attachment(&attachment.blob_id)
                .await
                .map_err(item_store_fail)?
            {
                Some(contents) => attachments.push((attachment, contents)),
                None => attachments_not_found.push(attachment.blob_id.clone()),
            }
        }
        if !attachments_not_found.is_empty() {
            return Err(SetError::invalid_properties()
                .with_property("attachments")
                .with_description("Attachment not found")
                .with_attachments_not_found(attachments_not_found));
        }

        let raw = build_message(create, &attachments).map_err(|_| {
            SetError::an_error_occurred().with_description("Could not assemble the message")
        })?;
        if raw.len() > self.config.max_size_message {
            return Err(SetError::invalid_arguments().with_description(format!(
                "Message length exceeds the maximum of {} bytes",
                self.config.max_size_message
            )));
        }

        let mailbox_refs = mailboxes.iter().collect::<Vec<_>>();
        let quota_roots = Self::quota_roots(&mailbox_refs);
        let delta = QuotaDelta::new(raw.len() as u64, 1);
        if !self.reserve_quota(&quota_roots, delta).await? {
            return Err(SetError::max_quota_reached().with_description("Max quota reached"));
        }

        let message = match self
            .store
            .append_message(
                account_id,
                mailboxes.iter().map(|mailbox| mailbox.id).collect(),
                raw,
                keywords,
                chrono::Utc::now().timestamp(),
            )
            .await
        {
            Ok(message) => message,
            Err(err) => {
                self.release_quota(&quota_roots, delta).await?;
                return Err(item_store_fail(err));
            }
        };

        if is_send {
            tracing::debug!(
                account_id,
                message_id = message.id,
                from = envelope_from.as_deref().unwrap_or_default(),
                "message placed in Outbox for submission"
            );
            self.spawn_submission(account_id, message.id);
        }

        Ok(Id::from(message.id))
    }

    async fn update_message(
        &self,
        id: Id,
        patch: &MessagePatch,
        access_token: &AccessToken,
    ) -> Result<(), SetError> {
        let account_id = access_token.primary_id();
        let message = self
            .store
            .get_message(account_id, id.document_id())
            .await
            .map_err(item_store_fail)?
            .ok_or_else(|| SetError::not_found().with_description("message not found"))?;

        if patch.keywords.is_some() && patch.has_flag_shorthand() {
            return Err(SetError::invalid_properties()
                .with_property("keywords")
                .with_description("Does not support keyword and is* at the same time"));
        }

        let mut keywords = match &patch.keywords {
            Some(map) => {
                let mut keywords = keywords_from_map(map)?;
                // The transient session flags are never patchable, but
                // whatever the store reports stays untouched.
                for keyword in &message.keywords {
                    if keyword.is_reserved() && !keywords.contains(keyword) {
                        keywords.push(keyword.clone());
                    }
                }
                keywords
            }
            None => {
                let mut keywords = message.keywords.clone();
                for (flag, keyword) in [
                    (patch.is_unread.map(|unread| !unread), Keyword::Seen),
                    (patch.is_flagged, Keyword::Flagged),
                    (patch.is_answered, Keyword::Answered),
                    (patch.is_draft, Keyword::Draft),
                    (patch.is_forwarded, Keyword::Forwarded),
                ] {
                    match flag {
                        Some(true) => {
                            if !keywords.contains(&keyword) {
                                keywords.push(keyword);
                            }
                        }
                        Some(false) => keywords.retain(|k| k != &keyword),
                        None => (),
                    }
                }
                keywords
            }
        };

        let mut moved_to_outbox = false;
        let mut new_mailbox_ids = None;
        if let Some(ids) = &patch.mailbox_ids {
            if ids.is_empty() {
                return Err(SetError::invalid_properties()
                    .with_property("mailboxIds")
                    .with_description("Message needs to be in at least one mailbox"));
            }

            let mut mailboxes = Vec::with_capacity(ids.len());
            for mailbox_id in ids {
                mailboxes.push(self.resolve_own_mailbox(account_id, *mailbox_id).await?);
            }

            let outbox_count = mailboxes
                .iter()
                .filter(|mailbox| mailbox.role == SpecialUse::Outbox)
                .count();
            if outbox_count > 0 {
                if outbox_count != mailboxes.len() {
                    return Err(SetError::invalid_properties()
                        .with_property("mailboxIds")
                        .with_description(
                            "When moving a message to Outbox, only Outboxes mailboxes \
                             should be targeted.",
                        ));
                }
                // Submission by move is reserved to stored drafts.
                if !message.has_keyword(&Keyword::Draft) {
                    return Err(SetError::invalid_properties()
                        .with_property("mailboxIds")
                        .with_description(
                            "Only message with '$Draft' keyword can be moved to Outbox",
                        ));
                }
                moved_to_outbox = true;
            }

            let target_ids = mailboxes
                .iter()
                .map(|mailbox| mailbox.id)
                .collect::<Vec<_>>();
            let unchanged = target_ids.len() == message.mailbox_ids.len()
                && target_ids
                    .iter()
                    .all(|id| message.mailbox_ids.contains(id));
            if !unchanged {
                // A move that lands the message under new quota-roots is
                // re-authorized for the footprint it adds there.
                let mut current_mailboxes = Vec::new();
                for mailbox_id in &message.mailbox_ids {
                    if let Some(mailbox) = self
                        .store
                        .get_mailbox(account_id, *mailbox_id)
                        .await
                        .map_err(item_store_fail)?
                    {
                        current_mailboxes.push(mailbox);
                    }
                }
                let current_refs = current_mailboxes.iter().collect::<Vec<_>>();
                let target_refs = mailboxes.iter().collect::<Vec<_>>();
                let current_roots = Self::quota_roots(&current_refs);
                let target_roots = Self::quota_roots(&target_refs);
                let gained = target_roots
                    .iter()
                    .filter(|root| !current_roots.contains(root))
                    .cloned()
                    .collect::<Vec<_>>();
                let vacated = current_roots
                    .iter()
                    .filter(|root| !target_roots.contains(root))
                    .cloned()
                    .collect::<Vec<_>>();

                let delta = QuotaDelta::new(message.size, 1);
                if !self.reserve_quota(&gained, delta).await? {
                    return Err(
                        SetError::max_quota_reached().with_description("Max quota reached")
                    );
                }
                new_mailbox_ids = Some((target_ids, vacated, delta));
            }
        }

        if keywords != message.keywords {
            self.store
                .set_keywords(account_id, message.id, keywords)
                .await
                .map_err(item_store_fail)?;
        }
        if let Some((target_ids, vacated, delta)) = new_mailbox_ids {
            self.store
                .move_message(account_id, message.id, target_ids)
                .await
                .map_err(item_store_fail)?;
            self.release_quota(&vacated, delta).await?;
        }

        if moved_to_outbox {
            self.spawn_submission(account_id, message.id);
        }

        Ok(())
    }

    async fn destroy_message(&self, id: Id, access_token: &AccessToken) -> Result<(), SetError> {
        let account_id = access_token.primary_id();
        match self.store.delete_message(account_id, id.document_id()).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(SetError::not_found()
                .with_description(format!("The message {id} can't be found"))),
            Err(err) => Err(item_store_fail(err)),
        }
    }

    async fn resolve_own_mailbox(
        &self,
        account_id: types::AccountId,
        id: Id,
    ) -> Result<Mailbox, SetError> {
        self.store
            .get_mailbox(account_id, id.document_id())
            .await
            .map_err(item_store_fail)?
            .ok_or_else(|| {
                SetError::an_error_occurred()
                    .with_description(format!("Mailbox {id} can not be found"))
            })
    }
}

/// Keywords arriving as a `{name: true}` map. Setting either transient
/// session flag fails the whole item.
fn keywords_from_map(map: &VecMap<String, bool>) -> Result<Vec<Keyword>, SetError> {
    let mut keywords = Vec::with_capacity(map.len());
    for (name, set) in map.iter() {
        if !*set {
            continue;
        }
        let keyword = Keyword::parse(name);
        if keyword.is_reserved() {
            return Err(SetError::invalid_properties()
                .with_property("keywords")
                .with_description("Does not allow to update 'Deleted' or 'Recent' flag"));
        }
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    Ok(keywords)
}

fn recipient_addresses(create: &MessageCreate) -> impl Iterator<Item = &str> {
    create
        .to
        .as_deref()
        .unwrap_or_default()
        .iter()
        .chain(create.cc.as_deref().unwrap_or_default())
        .chain(create.bcc.as_deref().unwrap_or_default())
        .filter_map(|address| address.email.as_deref())
}

fn address_list(addresses: &[EmailAddress]) -> Address<'_> {
    Address::new_list(
        addresses
            .iter()
            .filter_map(|address| {
                address.email.as_deref().map(|email| {
                    Address::new_address(address.name.as_deref(), email)
                })
            })
            .collect(),
    )
}

fn build_message(
    create: &MessageCreate,
    attachments: &[(&Attachment, Vec<u8>)],
) -> std::io::Result<Vec<u8>> {
    let mut builder = MessageBuilder::new();

    if let Some(from) = &create.from {
        if let Some(email) = from.email.as_deref() {
            builder = builder.from(Address::new_address(from.name.as_deref(), email));
        }
    }
    for (field, addresses) in [
        ("To", &create.to),
        ("Cc", &create.cc),
        ("Bcc", &create.bcc),
        ("Reply-To", &create.reply_to),
    ] {
        if let Some(addresses) = addresses {
            builder = builder.header(field, HeaderType::from(address_list(addresses)));
        }
    }
    if let Some(subject) = &create.subject {
        builder = builder.subject(subject.as_str());
    }
    for (name, value) in create.headers.iter().flat_map(|headers| headers.iter()) {
        builder = builder.header(
            name.clone(),
            HeaderType::Text(value.as_str().into()),
        );
    }
    if let Some(text) = &create.text_body {
        builder = builder.text_body(text.as_str());
    }
    if let Some(html) = &create.html_body {
        builder = builder.html_body(html.as_str());
    }
    for (attachment, contents) in attachments {
        builder = builder.attachment(
            attachment.type_.as_deref().unwrap_or("application/octet-stream"),
            attachment.name.as_deref().unwrap_or(attachment.blob_id.as_str()),
            contents.clone(),
        );
    }

    builder.write_to_vec()
}

fn item_store_fail(err: StoreError) -> SetError {
    tracing::error!(reason = %err, "storage failure");
    SetError::an_error_occurred().with_description(err.to_string())
}
