//! Working state of one inspection round and its transitions.
//!
//! `InspectionState` bundles the kart registry, the problem ledger, the
//! edit cursor and the batch-level note. Each transition either fails
//! without touching state or applies fully and returns the effects the
//! presentation layer must apply.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::effects::{EditorForm, Effect, FlaggedEntry};
use crate::error::InspectionError;
use crate::kart::{normalize_note, IssueTag, KartId, KartStatus, ProblemRecord};
use crate::ledger::ProblemLedger;
use crate::logging::{log_edit_refused, log_kart_flagged, log_problems_saved};
use crate::registry::KartRegistry;

#[derive(Debug, Clone)]
pub struct InspectionState {
    registry: KartRegistry,
    ledger: ProblemLedger,
    cursor: Option<KartId>,
    general_note: Option<String>,
}

impl InspectionState {
    pub fn new(kart_count: u32) -> Self {
        Self {
            registry: KartRegistry::new(kart_count),
            ledger: ProblemLedger::new(),
            cursor: None,
            general_note: None,
        }
    }

    pub fn registry(&self) -> &KartRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ProblemLedger {
        &self.ledger
    }

    pub fn cursor(&self) -> Option<KartId> {
        self.cursor
    }

    pub fn general_note(&self) -> Option<&str> {
        self.general_note.as_deref()
    }

    pub fn kart(&self, number: u32) -> Result<KartId, InspectionError> {
        self.registry.kart(number)
    }

    /// Derived from the flagged set and the ledger, so it cannot drift.
    pub fn status(&self, kart: KartId) -> KartStatus {
        if !self.registry.is_flagged(kart) {
            KartStatus::Untouched
        } else if self.ledger.has_complete(kart) {
            KartStatus::FlaggedSaved
        } else {
            KartStatus::FlaggedPending
        }
    }

    pub fn flagged_entries(&self) -> Vec<FlaggedEntry> {
        self.registry
            .flagged()
            .map(|kart| FlaggedEntry { kart, status: self.status(kart) })
            .collect()
    }

    /// Flagged karts lacking a non-empty issue list, ascending.
    pub fn incomplete_karts(&self) -> Vec<KartId> {
        self.registry
            .flagged()
            .filter(|k| !self.ledger.has_complete(*k))
            .collect()
    }

    pub fn is_pristine(&self) -> bool {
        self.registry.flagged_count() == 0
            && self.ledger.is_empty()
            && self.cursor.is_none()
            && self.general_note.is_none()
    }

    fn list_effect(&self) -> Effect {
        Effect::FlaggedList { entries: self.flagged_entries() }
    }

    fn editor_form(&self, kart: KartId) -> EditorForm {
        match self.ledger.get(kart) {
            Some(rec) => EditorForm {
                kart,
                issues: rec.issues.clone(),
                note: rec.note.clone().unwrap_or_default(),
            },
            None => EditorForm::empty(kart),
        }
    }

    pub fn select_for_edit(&mut self, kart: KartId) -> Result<Vec<Effect>, InspectionError> {
        if let Some(current) = self.cursor {
            if current != kart && self.status(current) == KartStatus::FlaggedPending {
                log_edit_refused(kart.get(), current.get());
                return Err(InspectionError::EditBlocked { blocking: current });
            }
        }

        let mut effects = Vec::new();
        if self.registry.flag(kart) {
            log_kart_flagged(kart.get(), true);
            effects.push(Effect::RenderKart { kart, status: self.status(kart) });
        }
        self.cursor = Some(kart);
        effects.push(self.list_effect());
        effects.push(Effect::ShowEditor { form: self.editor_form(kart) });
        Ok(effects)
    }

    /// Returns the kart whose record was written.
    pub fn save_current_edit(
        &mut self,
        issues: BTreeSet<IssueTag>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(KartId, Vec<Effect>), InspectionError> {
        let kart = self.cursor.ok_or(InspectionError::NoActiveEdit)?;
        let record = ProblemRecord::new(issues, note, now);
        log_problems_saved(kart.get(), record.issues.len(), record.note.is_some());
        self.ledger.save(kart, record);
        self.cursor = None;

        let effects = vec![
            Effect::RenderKart { kart, status: self.status(kart) },
            self.list_effect(),
            Effect::ClearEditor,
            Effect::HideEditor,
        ];
        Ok((kart, effects))
    }

    /// Drops the kart in edit from the flagged set and the ledger entirely.
    pub fn clear_current_edit(&mut self) -> Result<(KartId, Vec<Effect>), InspectionError> {
        let kart = self.cursor.ok_or(InspectionError::NoActiveEdit)?;
        self.drop_kart(kart);
        self.cursor = None;

        let effects = vec![
            Effect::RenderKart { kart, status: KartStatus::Untouched },
            Effect::ClearEditor,
            Effect::HideEditor,
            self.list_effect(),
        ];
        Ok((kart, effects))
    }

    pub fn remove_kart(&mut self, kart: KartId) -> Vec<Effect> {
        self.drop_kart(kart);
        let mut effects = vec![
            Effect::RenderKart { kart, status: KartStatus::Untouched },
            self.list_effect(),
        ];
        if self.cursor == Some(kart) {
            self.cursor = None;
            effects.push(Effect::HideEditor);
        }
        effects
    }

    fn drop_kart(&mut self, kart: KartId) {
        if self.registry.unflag(kart) {
            log_kart_flagged(kart.get(), false);
        }
        self.ledger.remove(kart);
    }

    pub fn reset_all(&mut self) -> Vec<Effect> {
        self.registry.clear();
        self.ledger.clear();
        self.cursor = None;
        self.general_note = None;

        let mut effects: Vec<Effect> = self
            .registry
            .all()
            .map(|kart| Effect::RenderKart { kart, status: KartStatus::Untouched })
            .collect();
        effects.extend([
            Effect::ClearEditor,
            Effect::ClearGeneralNote,
            Effect::HideEditor,
            self.list_effect(),
        ]);
        effects
    }

    pub fn set_general_note(&mut self, text: &str) {
        self.general_note = normalize_note(text);
    }

    /// Shows every flagged kart as saved once its batch is archived.
    pub fn mark_submitted(&self) -> Vec<Effect> {
        self.registry
            .flagged()
            .map(|kart| Effect::RenderKart { kart, status: KartStatus::FlaggedSaved })
            .collect()
    }
}
