/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;
use types::id::Id;

/// One `sendMDN` item as it arrives on the wire. All fields are optional
/// at parse time; mandatory-field validation happens when the item is
/// processed so the failure can name the missing field.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdnObject {
    pub message_id: Option<Id>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    #[serde(rename = "reportingUA")]
    pub reporting_ua: Option<String>,
    pub disposition: Option<MdnDispositionObject>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdnDispositionObject {
    pub action_mode: Option<String>,
    pub sending_mode: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    ManualAction,
    AutomaticAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendingMode {
    SentManually,
    SentAutomatically,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    Deleted,
    Dispatched,
    Displayed,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdnParseError(pub String);

impl fmt::Display for MdnParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MdnParseError {}

impl ActionMode {
    pub fn parse(value: &str) -> Result<Self, MdnParseError> {
        match value {
            "manual-action" => Ok(ActionMode::ManualAction),
            "automatic-action" => Ok(ActionMode::AutomaticAction),
            other => Err(MdnParseError(format!(
                "Unrecognized MDN Disposition action mode {other}. \
                 Should be one of [manual-action, automatic-action]"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionMode::ManualAction => "manual-action",
            ActionMode::AutomaticAction => "automatic-action",
        }
    }
}

impl SendingMode {
    pub fn parse(value: &str) -> Result<Self, MdnParseError> {
        match value {
            "MDN-sent-manually" => Ok(SendingMode::SentManually),
            "MDN-sent-automatically" => Ok(SendingMode::SentAutomatically),
            other => Err(MdnParseError(format!(
                "Unrecognized MDN Disposition sending mode {other}. \
                 Should be one of [MDN-sent-manually, MDN-sent-automatically]"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SendingMode::SentManually => "MDN-sent-manually",
            SendingMode::SentAutomatically => "MDN-sent-automatically",
        }
    }
}

impl DispositionType {
    pub fn parse(value: &str) -> Result<Self, MdnParseError> {
        match value {
            "deleted" => Ok(DispositionType::Deleted),
            "dispatched" => Ok(DispositionType::Dispatched),
            "displayed" => Ok(DispositionType::Displayed),
            "processed" => Ok(DispositionType::Processed),
            other => Err(MdnParseError(format!(
                "Unrecognized MDN Disposition type {other}. \
                 Should be one of [deleted, dispatched, displayed, processed]"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionType::Deleted => "deleted",
            DispositionType::Dispatched => "dispatched",
            DispositionType::Displayed => "displayed",
            DispositionType::Processed => "processed",
        }
    }
}

/// Fully validated disposition of an MDN item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposition {
    pub action_mode: ActionMode,
    pub sending_mode: SendingMode,
    pub type_: DispositionType,
}

impl Disposition {
    /// Text of the `Disposition` field inside the
    /// `message/disposition-notification` part.
    pub fn as_field(&self) -> String {
        format!(
            "{}/{};{}",
            self.action_mode.as_str(),
            self.sending_mode.as_str(),
            self.type_.as_str()
        )
    }
}
