//! End-to-end inspection rounds through the public controller API:
//! select -> save -> submit -> archive -> reset.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kartcheck::archive::LocalArchive;
use kartcheck::config::Config;
use kartcheck::controller::Controller;
use kartcheck::effects::Effect;
use kartcheck::error::InspectionError;
use kartcheck::kart::{IssueTag, KartStatus};
use kartcheck::submission::SubmissionRecord;
use kartcheck::sync::{RemoteSync, SyncOutcome, SyncReceipt};

/// Records every pushed submission and answers with a fixed outcome.
struct RecordingSync {
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl RecordingSync {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self { fail, calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl RemoteSync for RecordingSync {
    async fn push(&self, record: &SubmissionRecord) -> SyncOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(record.submission_id.clone());
        if self.fail {
            SyncOutcome::Failed("connection refused".to_string())
        } else {
            SyncOutcome::Ok(SyncReceipt { success: true, last_row: Some(7), ..Default::default() })
        }
    }
}

fn controller_with(sync: Arc<RecordingSync>) -> Controller {
    Controller::new(Config::default(), LocalArchive::in_memory(), sync)
}

fn tags(t: &[IssueTag]) -> BTreeSet<IssueTag> {
    t.iter().copied().collect()
}

fn status(ctl: &Controller, n: u32) -> KartStatus {
    let kart = ctl.state().kart(n).unwrap();
    ctl.state().status(kart)
}

#[test]
fn test_remove_then_reselect_has_no_stale_record() {
    let mut ctl = controller_with(RecordingSync::new(false));
    ctl.select_for_edit(5).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Brakes]), Some("grinding".into())).unwrap();
    ctl.remove_kart(5).unwrap();
    assert_eq!(status(&ctl, 5), KartStatus::Untouched);

    let effects = ctl.select_for_edit(5).unwrap();
    assert_eq!(status(&ctl, 5), KartStatus::FlaggedPending);
    let kart = ctl.state().kart(5).unwrap();
    assert!(ctl.state().ledger().get(kart).is_none());
    let form = effects.iter().find_map(|e| match e {
        Effect::ShowEditor { form } => Some(form.clone()),
        _ => None,
    });
    let form = form.expect("editor opened");
    assert!(form.issues.is_empty());
    assert!(form.note.is_empty());
}

#[test]
fn test_edit_blocked_leaves_both_karts_unchanged() {
    let mut ctl = controller_with(RecordingSync::new(false));
    ctl.select_for_edit(1).unwrap();
    let err = ctl.select_for_edit(2).unwrap_err();
    assert!(matches!(err, InspectionError::EditBlocked { blocking } if blocking.get() == 1));
    assert_eq!(status(&ctl, 1), KartStatus::FlaggedPending);
    assert_eq!(status(&ctl, 2), KartStatus::Untouched);
}

#[test]
fn test_second_save_overwrites_first() {
    let mut ctl = controller_with(RecordingSync::new(false));
    ctl.select_for_edit(9).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Tires, IssueTag::Chain]), None).unwrap();
    assert_eq!(status(&ctl, 9), KartStatus::FlaggedSaved);
    assert_eq!(ctl.state().cursor(), None);

    ctl.select_for_edit(9).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Seat]), None).unwrap();
    let kart = ctl.state().kart(9).unwrap();
    assert_eq!(ctl.state().ledger().get(kart).unwrap().issues, tags(&[IssueTag::Seat]));
}

#[test]
fn test_incomplete_kart_blocks_submission() {
    let mut ctl = controller_with(RecordingSync::new(false));
    ctl.select_for_edit(3).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Brakes]), None).unwrap();
    ctl.select_for_edit(7).unwrap();

    let err = ctl.begin_submit().unwrap_err();
    match err {
        InspectionError::IncompleteKarts { karts } => {
            assert_eq!(karts.iter().map(|k| k.get()).collect::<Vec<_>>(), vec![7]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(ctl.archive().is_empty());
    assert!(!ctl.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn test_successful_round_archives_and_resets() {
    let sync = RecordingSync::new(false);
    let mut ctl = controller_with(sync.clone());
    ctl.select_for_edit(7).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Engine]), None).unwrap();
    ctl.select_for_edit(3).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Brakes, IssueTag::Pedals]), Some("soft".into())).unwrap();

    let effects = ctl.submit().await.unwrap();

    assert_eq!(ctl.archive().len(), 1);
    let record = ctl.archive().records()[0].clone();
    assert_eq!(record.kart_numbers(), vec![3, 7]);
    assert_eq!(record.issue_count(), 3);
    assert_eq!(record.center_label, "Gent 2025");
    assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
    assert_eq!(sync.seen.lock().unwrap()[0], record.submission_id);

    assert!(ctl.state().is_pristine());
    assert!(!ctl.is_submitting());
    assert!(effects.contains(&Effect::SubmitBusy { busy: true }));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::SuccessSummary { karts: 2, issues: 3, submission_id } if *submission_id == record.submission_id
    )));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notice { text, .. } if text.starts_with("Data saved locally"))));
}

#[tokio::test(start_paused = true)]
async fn test_failed_sync_keeps_local_success_path() {
    let sync = RecordingSync::new(true);
    let mut ctl = controller_with(sync.clone());
    ctl.select_for_edit(12).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::SeatBelt]), None).unwrap();
    ctl.set_general_note("fence panel 4 loose");

    let effects = ctl.submit().await.unwrap();

    assert_eq!(ctl.archive().len(), 1);
    assert_eq!(
        ctl.archive().records()[0].general_note.as_deref(),
        Some("fence panel 4 loose")
    );
    assert!(ctl.state().is_pristine());
    let notice = effects
        .iter()
        .position(|e| matches!(e, Effect::Notice { text, .. } if text.starts_with("Data saved locally")));
    let summary = effects.iter().position(|e| matches!(e, Effect::SuccessSummary { .. }));
    assert!(notice.unwrap() < summary.unwrap());
    assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_while_in_flight_is_noop() {
    let sync = RecordingSync::new(false);
    let mut ctl = controller_with(sync.clone());
    ctl.select_for_edit(20).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Bumpers]), None).unwrap();

    let dispatch = ctl.begin_submit().unwrap().expect("first submission starts");
    assert!(ctl.submit().await.unwrap().is_empty());
    assert_eq!(ctl.archive().len(), 1);

    let (outcome, notices) = dispatch.push().await;
    assert!(outcome.is_ok());
    assert!(notices.is_empty());
    dispatch.grace(&outcome).await;
    ctl.finish_submit();
    assert!(ctl.is_submitting());
    ctl.complete_cycle();
    assert!(!ctl.is_submitting());
    assert!(ctl.state().is_pristine());
    assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_and_note_only_rejections_differ() {
    let mut ctl = controller_with(RecordingSync::new(false));
    assert_eq!(ctl.begin_submit().unwrap_err(), InspectionError::EmptyAny);
    ctl.set_general_note("scoreboard offline");
    assert_eq!(ctl.begin_submit().unwrap_err(), InspectionError::NoKartsSelected);
    assert!(ctl.archive().is_empty());
}

#[test]
fn test_reset_all_twice_matches_once() {
    let mut ctl = controller_with(RecordingSync::new(false));
    ctl.select_for_edit(1).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Throttle]), None).unwrap();
    ctl.select_for_edit(2).unwrap();
    let once = ctl.reset_all();
    let twice = ctl.reset_all();
    assert_eq!(once, twice);
    assert!(ctl.state().is_pristine());
}

#[test]
fn test_archive_file_written_on_submit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kartChecklistData.json");
    let cfg = Config { archive_path: path.to_string_lossy().into_owned(), ..Config::default() };
    let mut ctl = Controller::new(cfg, LocalArchive::fresh(&path), RecordingSync::new(false));
    ctl.select_for_edit(4).unwrap();
    ctl.save_current_edit(tags(&[IssueTag::Steering]), None).unwrap();
    ctl.begin_submit().unwrap().expect("submission starts");

    let reloaded = LocalArchive::load(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    let (entry_id, record) = reloaded.entries().next().unwrap();
    assert!(entry_id.starts_with("checklist_"));
    assert_eq!(record.kart_numbers(), vec![4]);
}
