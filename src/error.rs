//! Error kinds raised by the inspection core.
//!
//! Every `InspectionError` is recovered locally: the rejected operation
//! leaves state untouched and the adapter shows the matching notice.
//! `SyncError` never escapes the submission pipeline; it is folded into
//! `SyncOutcome::Failed`.

use thiserror::Error;

use crate::effects::{Effect, Tone};
use crate::i18n::{Language, Message};
use crate::kart::KartId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectionError {
    /// The edit cursor sits on a kart that has no saved problems yet.
    #[error("kart #{blocking} must be completed before selecting another kart")]
    EditBlocked { blocking: KartId },

    #[error("no kart selected for editing")]
    NoActiveEdit,

    /// No karts, no problems and no general note.
    #[error("nothing to submit")]
    EmptyAny,

    #[error("no karts selected")]
    NoKartsSelected,

    #[error("karts without problems: {karts:?}")]
    IncompleteKarts { karts: Vec<KartId> },

    #[error("kart #{0} does not exist")]
    UnknownKart(u32),
}

impl InspectionError {
    pub fn message(&self) -> Message {
        match self {
            InspectionError::EditBlocked { blocking } => Message::EditBlocked(*blocking),
            InspectionError::NoActiveEdit => Message::NoKartInEdit,
            InspectionError::EmptyAny => Message::NothingToSubmit,
            InspectionError::NoKartsSelected => Message::NoKartsSelected,
            InspectionError::IncompleteKarts { karts } => Message::IncompleteKarts(karts.clone()),
            InspectionError::UnknownKart(n) => Message::UnknownKart(*n),
        }
    }

    /// Short reason tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InspectionError::EditBlocked { .. } => "edit_blocked",
            InspectionError::NoActiveEdit => "no_active_edit",
            InspectionError::EmptyAny => "empty_any",
            InspectionError::NoKartsSelected => "no_karts_selected",
            InspectionError::IncompleteKarts { .. } => "incomplete_karts",
            InspectionError::UnknownKart(_) => "unknown_kart",
        }
    }

    /// Edit refusals use the small popup; everything else is a transient notice.
    pub fn notice(&self, lang: Language, ttl_ms: u64) -> Effect {
        let text = self.message().render(lang);
        match self {
            InspectionError::EditBlocked { .. } => Effect::Popup { text, ttl_ms },
            _ => Effect::Notice { tone: Tone::Error, text, ttl_ms },
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no sync endpoint configured")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned HTTP {0}")]
    Status(u16),

    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote rejected submission: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_blocked_uses_popup() {
        let err = InspectionError::EditBlocked { blocking: KartId::new(4, 36).unwrap() };
        match err.notice(Language::En, 5000) {
            Effect::Popup { text, ttl_ms } => {
                assert!(text.contains("#4"));
                assert_eq!(ttl_ms, 5000);
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_validation_errors_use_error_notice() {
        for err in [
            InspectionError::EmptyAny,
            InspectionError::NoKartsSelected,
            InspectionError::NoActiveEdit,
        ] {
            assert!(matches!(err.notice(Language::Nl, 250), Effect::Notice { tone: Tone::Error, ttl_ms: 250, .. }));
        }
    }

    #[test]
    fn test_empty_any_and_no_karts_have_distinct_wording() {
        assert_ne!(
            InspectionError::EmptyAny.message().render(Language::En),
            InspectionError::NoKartsSelected.message().render(Language::En)
        );
    }
}
