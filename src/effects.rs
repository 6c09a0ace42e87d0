//! Render instructions produced by state transitions.
//!
//! Transitions never touch the presentation layer. They return `Effect`s
//! in the order the adapter should apply them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::i18n::Language;
use crate::kart::{IssueTag, KartId, KartStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Error,
}

/// Editor contents when a kart is opened for problem entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorForm {
    pub kart: KartId,
    pub issues: BTreeSet<IssueTag>,
    pub note: String,
}

impl EditorForm {
    pub fn empty(kart: KartId) -> Self {
        Self { kart, issues: BTreeSet::new(), note: String::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlaggedEntry {
    pub kart: KartId,
    pub status: KartStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    RenderKart { kart: KartId, status: KartStatus },
    ShowEditor { form: EditorForm },
    ClearEditor,
    HideEditor,
    /// Sorted flagged karts with their status
    FlaggedList { entries: Vec<FlaggedEntry> },
    /// Banner the adapter removes after `ttl_ms`
    Notice { tone: Tone, text: String, ttl_ms: u64 },
    /// Small error popup the adapter removes after `ttl_ms`
    Popup { text: String, ttl_ms: u64 },
    ClearGeneralNote,
    SubmitBusy { busy: bool },
    SuccessSummary { karts: usize, issues: usize, submission_id: String },
    /// Recompute every label; `editing` keeps the editor heading's kart number
    Relabel { language: Language, date: String, editing: Option<KartId> },
}

impl Effect {
    pub fn success(text: String, ttl_ms: u64) -> Self {
        Effect::Notice { tone: Tone::Success, text, ttl_ms }
    }

    pub fn error(text: String, ttl_ms: u64) -> Self {
        Effect::Notice { tone: Tone::Error, text, ttl_ms }
    }
}
