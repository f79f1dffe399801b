/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod acl;
pub mod id;
pub mod keyword;
pub mod special_use;

pub type AccountId = u32;
pub type DocumentId = u32;
