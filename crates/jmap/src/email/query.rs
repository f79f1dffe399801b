/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    AccessToken, Engine,
    api::{acl::EffectiveAcl, query::Paginator},
    email::{filter::matches, sort},
    store_fail,
};
use ahash::AHashSet;
use jmap_proto::{
    error::method::MethodError,
    method::get_message_list::{GetMessageListRequest, GetMessageListResponse},
    sort::{Comparator, SortProperty},
};
use mail_parser::MessageParser;
use store::MessageData;
use types::{acl::Acl, id::Id};

impl Engine {
    pub async fn get_message_list(
        &self,
        request: GetMessageListRequest,
        access_token: &AccessToken,
    ) -> Result<GetMessageListResponse, MethodError> {
        request.validate()?;
        let paginator = Paginator::new(
            request.position,
            request.limit,
            self.config.query_max_results,
        )?;
        let collapse_threads = request.collapse_threads.unwrap_or(false);
        let comparators = request
            .sort
            .filter(|sort| !sort.is_empty())
            .unwrap_or_else(|| vec![Comparator::ascending(SortProperty::Date)]);

        // Candidate set: the viewer's own messages plus, for delegated
        // accounts, messages residing in a mailbox shared with at least
        // Read. Lookup alone exposes the mailbox, never its contents.
        let mut candidates: Vec<MessageData> = Vec::new();
        for account_id in self.store.list_accounts().await.map_err(store_fail)? {
            if access_token.is_member(account_id) {
                candidates.extend(
                    self.store
                        .list_messages(account_id)
                        .await
                        .map_err(store_fail)?,
                );
            } else {
                let readable = self
                    .store
                    .list_mailboxes(account_id)
                    .await
                    .map_err(store_fail)?
                    .into_iter()
                    .filter(|mailbox| {
                        mailbox
                            .acls
                            .as_slice()
                            .effective_acl(access_token)
                            .contains(Acl::Read)
                    })
                    .map(|mailbox| mailbox.id)
                    .collect::<AHashSet<_>>();
                if readable.is_empty() {
                    continue;
                }
                candidates.extend(
                    self.store
                        .list_messages(account_id)
                        .await
                        .map_err(store_fail)?
                        .into_iter()
                        .filter(|message| {
                            message
                                .mailbox_ids
                                .iter()
                                .any(|id| readable.contains(id))
                        }),
                );
            }
        }

        let parser = MessageParser::default();
        let parsed = candidates
            .iter()
            .map(|message| parser.parse(message.raw.as_slice()))
            .collect::<Vec<_>>();

        let mut order = Vec::with_capacity(candidates.len());
        for (idx, message) in candidates.iter().enumerate() {
            let matched = match &request.filter {
                Some(filter) => matches(filter, message, parsed[idx].as_ref()),
                None => true,
            };
            if matched {
                order.push(idx);
            }
        }

        let keys = candidates
            .iter()
            .enumerate()
            .map(|(idx, message)| sort::SortKeys::build(message, parsed[idx].as_ref()))
            .collect::<Vec<_>>();
        order.sort_by(|&a, &b| sort::compare(&keys[a], &keys[b], &comparators));

        if collapse_threads {
            let mut seen_threads = AHashSet::new();
            order.retain(|&idx| {
                seen_threads.insert((candidates[idx].account_id, candidates[idx].thread_id))
            });
        }

        let total = order.len();
        let message_ids = paginator
            .paginate(order)
            .into_iter()
            .map(|idx| Id::from(candidates[idx].id))
            .collect();

        Ok(GetMessageListResponse {
            message_ids,
            position: paginator.position,
            total: Some(total),
        })
    }
}
