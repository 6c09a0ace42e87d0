//! The session controller: owns all working state and history and drives
//! the submission pipeline.
//!
//! ```text
//! select -> edit -> save/clear -> submit
//!                                   |
//!   begin_submit: validate, snapshot, archive, persist
//!   Dispatch::push: remote push (always resolves), local-only notice
//!   Dispatch::grace: pause after a failed push
//!   finish_submit: success summary
//!   ... reset delay ...
//!   complete_cycle: reset working state, release in-flight guard
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::time::{sleep, Duration};

use crate::archive::LocalArchive;
use crate::config::Config;
use crate::dashboard::{export_csv, Dashboard};
use crate::effects::Effect;
use crate::error::InspectionError;
use crate::i18n::{today, Language, Message};
use crate::kart::IssueTag;
use crate::logging::{log, log_submission, log_submit_rejected, obj, v_str, Domain, Level};
use crate::session::InspectionState;
use crate::submission::{assemble, BatchContext, SubmissionRecord};
use crate::sync::{self, RemoteSync, SyncOutcome};

/// A submission that has been archived and awaits remote delivery.
pub struct Dispatch {
    pub record: SubmissionRecord,
    /// Effects to apply before the remote call resolves
    pub effects: Vec<Effect>,
    sync: Arc<dyn RemoteSync>,
    failure_grace: Duration,
    local_only: Effect,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("submission_id", &self.record.submission_id)
            .field("effects", &self.effects.len())
            .finish()
    }
}

impl Dispatch {
    /// Pushes the record. A failed push yields the local-only notice,
    /// to be shown right away.
    pub async fn push(&self) -> (SyncOutcome, Vec<Effect>) {
        let outcome = self.sync.push(&self.record).await;
        let effects = if outcome.is_ok() { Vec::new() } else { vec![self.local_only.clone()] };
        (outcome, effects)
    }

    /// After a failed push, keeps the local-only notice up on its own
    /// before the summary replaces the view.
    pub async fn grace(&self, outcome: &SyncOutcome) {
        if !outcome.is_ok() && !self.failure_grace.is_zero() {
            sleep(self.failure_grace).await;
        }
    }
}

#[derive(Debug, Clone)]
struct PendingSummary {
    submission_id: String,
    karts: usize,
    issues: usize,
}

pub struct Controller {
    cfg: Config,
    state: InspectionState,
    archive: LocalArchive,
    sync: Arc<dyn RemoteSync>,
    language: Language,
    in_flight: bool,
    pending: Option<PendingSummary>,
}

impl Controller {
    pub fn new(cfg: Config, archive: LocalArchive, sync: Arc<dyn RemoteSync>) -> Self {
        let mut ctl = Self {
            state: InspectionState::new(cfg.kart_count),
            language: cfg.language,
            cfg,
            archive,
            sync,
            in_flight: false,
            pending: None,
        };
        ctl.reset_all();
        ctl
    }

    /// Opens the archive per `reload_archive` and picks the sync backend.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let archive = if cfg.reload_archive {
            LocalArchive::load(&cfg.archive_path)?
        } else {
            LocalArchive::fresh(&cfg.archive_path)
        };
        log(
            Level::Info,
            Domain::System,
            "session_start",
            obj(&[
                ("archive", v_str(&cfg.archive_path)),
                ("reloaded_entries", serde_json::json!(archive.len())),
                ("sync", v_str(cfg.sync_url.as_ref().map(|u| u.as_str()).unwrap_or("none"))),
            ]),
        );
        let sync = sync::from_config(&cfg);
        Ok(Self::new(cfg, archive, sync))
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &InspectionState {
        &self.state
    }

    pub fn archive(&self) -> &LocalArchive {
        &self.archive
    }

    pub fn dashboard(&self) -> Dashboard<'_> {
        Dashboard::new(&self.archive)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.cfg.reset_delay_ms)
    }

    pub fn current_date(&self) -> String {
        today(self.language)
    }

    fn notice_ttl(&self) -> u64 {
        self.cfg.notice_ttl_ms
    }

    /// The notice or popup for a rejected operation.
    pub fn notice_for(&self, err: &InspectionError) -> Effect {
        err.notice(self.language, self.notice_ttl())
    }

    pub fn select_for_edit(&mut self, number: u32) -> Result<Vec<Effect>, InspectionError> {
        let kart = self.state.kart(number)?;
        self.state.select_for_edit(kart)
    }

    pub fn save_current_edit(
        &mut self,
        issues: BTreeSet<IssueTag>,
        note: Option<String>,
    ) -> Result<Vec<Effect>, InspectionError> {
        let (kart, mut effects) = self.state.save_current_edit(issues, note, Utc::now())?;
        effects.push(Effect::success(
            Message::ProblemsSaved(kart).render(self.language),
            self.notice_ttl(),
        ));
        Ok(effects)
    }

    pub fn clear_current_edit(&mut self) -> Result<Vec<Effect>, InspectionError> {
        let (kart, mut effects) = self.state.clear_current_edit()?;
        effects.push(Effect::success(
            Message::KartCleared(kart).render(self.language),
            self.notice_ttl(),
        ));
        Ok(effects)
    }

    pub fn remove_kart(&mut self, number: u32) -> Result<Vec<Effect>, InspectionError> {
        let kart = self.state.kart(number)?;
        Ok(self.state.remove_kart(kart))
    }

    pub fn reset_all(&mut self) -> Vec<Effect> {
        self.state.reset_all()
    }

    /// User-initiated reset, with confirmation notice.
    pub fn clear_all(&mut self) -> Vec<Effect> {
        let mut effects = self.reset_all();
        effects.push(Effect::success(Message::AllCleared.render(self.language), self.notice_ttl()));
        effects
    }

    pub fn set_general_note(&mut self, text: &str) {
        self.state.set_general_note(text);
    }

    pub fn toggle_language(&mut self) -> Vec<Effect> {
        self.language = self.language.toggle();
        vec![Effect::Relabel {
            language: self.language,
            date: self.current_date(),
            editing: self.state.cursor(),
        }]
    }

    /// Validates, snapshots, archives and persists. `Ok(None)` when a
    /// submission is already in flight.
    pub fn begin_submit(&mut self) -> Result<Option<Dispatch>, InspectionError> {
        if self.in_flight {
            return Ok(None);
        }
        let ctx = BatchContext {
            date: self.current_date(),
            center_label: self.cfg.center_label.clone(),
            inspector: self.cfg.inspector.clone(),
        };
        let now = Utc::now();
        let record = match assemble(&self.state, &ctx, now) {
            Ok(r) => r,
            Err(err) => {
                log_submit_rejected(err.kind());
                return Err(err);
            }
        };

        self.in_flight = true;
        let mut effects = vec![Effect::SubmitBusy { busy: true }];

        let entry_id = self.archive.append(record.clone(), now.timestamp_millis() as u64);
        log_submission(
            &record.submission_id,
            &entry_id,
            &record.kart_numbers(),
            record.issue_count(),
        );
        if let Err(err) = self.archive.persist() {
            // The entry stays in the in-memory archive.
            log(
                Level::Error,
                Domain::Archive,
                "persist_failed",
                obj(&[("entry_id", v_str(&entry_id)), ("error", v_str(&format!("{:#}", err)))]),
            );
            effects.push(Effect::error(
                Message::ArchiveWriteFailed.render(self.language),
                self.notice_ttl(),
            ));
        }
        effects.extend(self.state.mark_submitted());

        self.pending = Some(PendingSummary {
            submission_id: record.submission_id.clone(),
            karts: record.flagged_karts.len(),
            issues: record.issue_count(),
        });
        Ok(Some(Dispatch {
            record,
            effects,
            sync: Arc::clone(&self.sync),
            failure_grace: Duration::from_millis(self.cfg.sync_failure_grace_ms),
            local_only: Effect::error(
                Message::SavedLocallyOnly.render(self.language),
                self.notice_ttl(),
            ),
        }))
    }

    /// Same continuation for both remote outcomes.
    pub fn finish_submit(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(p) = self.pending.take() {
            effects.push(Effect::SuccessSummary {
                karts: p.karts,
                issues: p.issues,
                submission_id: p.submission_id,
            });
        }
        effects.push(Effect::SubmitBusy { busy: false });
        effects
    }

    /// Runs after the reset delay: clears the round and releases the guard.
    pub fn complete_cycle(&mut self) -> Vec<Effect> {
        self.in_flight = false;
        self.clear_all()
    }

    /// The whole pipeline in one call. Returns no effects when another
    /// submission is in flight.
    pub async fn submit(&mut self) -> Result<Vec<Effect>, InspectionError> {
        let Some(dispatch) = self.begin_submit()? else {
            return Ok(Vec::new());
        };
        let mut effects = dispatch.effects.clone();
        let (outcome, notices) = dispatch.push().await;
        effects.extend(notices);
        dispatch.grace(&outcome).await;
        effects.extend(self.finish_submit());
        sleep(self.reset_delay()).await;
        effects.extend(self.complete_cycle());
        Ok(effects)
    }

    /// Writes the whole archive as CSV to `path`. A failed write is
    /// reported as a notice; the session carries on.
    pub fn export_archive(&self, path: &str) -> Vec<Effect> {
        let records = self.archive.records();
        match std::fs::write(path, export_csv(&records)) {
            Ok(()) => {
                log(
                    Level::Info,
                    Domain::Dashboard,
                    "export",
                    obj(&[("path", v_str(path)), ("rows", serde_json::json!(records.len()))]),
                );
                let msg = Message::ExportWritten { path: path.to_string(), rows: records.len() };
                vec![Effect::success(msg.render(self.language), self.notice_ttl())]
            }
            Err(err) => {
                log(
                    Level::Error,
                    Domain::Dashboard,
                    "export_failed",
                    obj(&[("path", v_str(path)), ("error", v_str(&err.to_string()))]),
                );
                let msg = Message::ExportFailed { path: path.to_string() };
                vec![Effect::error(msg.render(self.language), self.notice_ttl())]
            }
        }
    }
}
