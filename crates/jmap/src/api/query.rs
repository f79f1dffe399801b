/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use jmap_proto::error::method::MethodError;

/// JSON numbers are exact only up to 2^53; the draft dialect rejects
/// positions at or beyond it.
const MAX_POSITION: i64 = 1 << 53;

/// Applies `position`/`limit` bounds to an ordered result sequence.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    pub position: usize,
    pub limit: usize,
}

impl Paginator {
    pub fn new(
        position: Option<i64>,
        limit: Option<usize>,
        default_limit: usize,
    ) -> Result<Self, MethodError> {
        let position = position.unwrap_or(0);
        if !(0..MAX_POSITION).contains(&position) {
            return Err(MethodError::invalid_arguments(
                "value should be positive and less than 2^53",
            ));
        }

        Ok(Paginator {
            position: position as usize,
            limit: limit.unwrap_or(default_limit),
        })
    }

    /// Skips `position` items, then yields up to `limit`.
    pub fn paginate<T>(&self, ordered: impl IntoIterator<Item = T>) -> Vec<T> {
        ordered
            .into_iter()
            .skip(self.position)
            .take(self.limit)
            .collect()
    }
}
