/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Usage and limits tracked for one quota-root. A missing limit means the
/// resource is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quota {
    pub used_storage: u64,
    pub used_messages: u64,
    pub max_storage: Option<u64>,
    pub max_messages: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaDelta {
    pub storage: u64,
    pub messages: u64,
}

impl QuotaDelta {
    pub fn new(storage: u64, messages: u64) -> Self {
        QuotaDelta { storage, messages }
    }

    pub fn is_empty(&self) -> bool {
        self.storage == 0 && self.messages == 0
    }
}

impl Quota {
    pub fn fits(&self, delta: QuotaDelta) -> bool {
        self.max_storage
            .is_none_or(|max| self.used_storage + delta.storage <= max)
            && self
                .max_messages
                .is_none_or(|max| self.used_messages + delta.messages <= max)
    }

    pub fn reserve(&mut self, delta: QuotaDelta) {
        self.used_storage += delta.storage;
        self.used_messages += delta.messages;
    }

    pub fn release(&mut self, delta: QuotaDelta) {
        self.used_storage = self.used_storage.saturating_sub(delta.storage);
        self.used_messages = self.used_messages.saturating_sub(delta.messages);
    }
}
