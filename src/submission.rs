//! Batch validation and the immutable submission snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::InspectionError;
use crate::kart::{KartId, ProblemRecord};
use crate::session::InspectionState;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// One batch report. Built once by [`assemble`], never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "submissionId")]
    pub submission_id: String,
    pub date: String,
    #[serde(rename = "center")]
    pub center_label: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "kartsWithIssues")]
    pub flagged_karts: Vec<KartId>,
    #[serde(rename = "kartProblems")]
    pub problems_by_kart: BTreeMap<KartId, ProblemRecord>,
    #[serde(rename = "otherFailures", default, with = "crate::kart::note_text")]
    pub general_note: Option<String>,
    pub inspector: String,
}

impl SubmissionRecord {
    pub fn issue_count(&self) -> usize {
        self.problems_by_kart.values().map(|r| r.issues.len()).sum()
    }

    pub fn kart_numbers(&self) -> Vec<u32> {
        self.flagged_karts.iter().map(|k| k.get()).collect()
    }
}

/// Labels stamped onto every record of a session.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub date: String,
    pub center_label: String,
    pub inspector: String,
}

/// Checks run in order; the first failure wins and nothing is mutated.
pub fn validate(state: &InspectionState) -> Result<(), InspectionError> {
    let no_karts = state.registry().flagged_count() == 0;
    if no_karts && state.general_note().is_none() && state.ledger().is_empty() {
        return Err(InspectionError::EmptyAny);
    }
    if no_karts {
        return Err(InspectionError::NoKartsSelected);
    }
    let karts = state.incomplete_karts();
    if !karts.is_empty() {
        return Err(InspectionError::IncompleteKarts { karts });
    }
    Ok(())
}

/// `SUB_<epoch ms>_<9 base36 chars>`
pub fn generate_submission_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("SUB_{}_{}", now.timestamp_millis(), suffix)
}

/// Validates and snapshots the working state.
pub fn assemble(
    state: &InspectionState,
    ctx: &BatchContext,
    now: DateTime<Utc>,
) -> Result<SubmissionRecord, InspectionError> {
    validate(state)?;
    let flagged_karts: Vec<KartId> = state.registry().flagged().collect();
    Ok(SubmissionRecord {
        submission_id: generate_submission_id(now, &mut rand::thread_rng()),
        date: ctx.date.clone(),
        center_label: ctx.center_label.clone(),
        created_at: now,
        problems_by_kart: state.ledger().snapshot(flagged_karts.iter().copied()),
        flagged_karts,
        general_note: state.general_note().map(str::to_string),
        inspector: ctx.inspector.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kart::IssueTag;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{BTreeSet, HashSet};

    fn k(n: u32) -> KartId {
        KartId::new(n, 36).unwrap()
    }

    fn ctx() -> BatchContext {
        BatchContext {
            date: "19/10/2026".to_string(),
            center_label: "Gent 2025".to_string(),
            inspector: "User".to_string(),
        }
    }

    fn save(s: &mut InspectionState, n: u32, tags: &[IssueTag]) {
        s.select_for_edit(k(n)).unwrap();
        let issues: BTreeSet<IssueTag> = tags.iter().copied().collect();
        s.save_current_edit(issues, None, Utc::now()).unwrap();
    }

    #[test]
    fn test_empty_state_rejected_as_empty_any() {
        let s = InspectionState::new(36);
        assert_eq!(validate(&s), Err(InspectionError::EmptyAny));
    }

    #[test]
    fn test_note_only_rejected_as_no_karts() {
        let mut s = InspectionState::new(36);
        s.set_general_note("track barrier loose");
        assert_eq!(validate(&s), Err(InspectionError::NoKartsSelected));
    }

    #[test]
    fn test_incomplete_lists_exactly_missing_karts() {
        let mut s = InspectionState::new(36);
        save(&mut s, 3, &[IssueTag::Brakes]);
        s.select_for_edit(k(7)).unwrap();
        assert_eq!(
            validate(&s),
            Err(InspectionError::IncompleteKarts { karts: vec![k(7)] })
        );
    }

    #[test]
    fn test_assemble_snapshots_sorted_karts() {
        let mut s = InspectionState::new(36);
        save(&mut s, 7, &[IssueTag::Tires]);
        save(&mut s, 3, &[IssueTag::Brakes, IssueTag::Chain]);
        s.set_general_note("  gate sticks  ");
        let rec = assemble(&s, &ctx(), Utc::now()).unwrap();
        assert_eq!(rec.flagged_karts, vec![k(3), k(7)]);
        assert_eq!(rec.problems_by_kart.len(), 2);
        assert_eq!(rec.issue_count(), 3);
        assert_eq!(rec.general_note.as_deref(), Some("gate sticks"));
        assert!(rec.submission_id.starts_with("SUB_"));
    }

    #[test]
    fn test_submission_ids_are_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();
        let ids: HashSet<String> = (0..500).map(|_| generate_submission_id(now, &mut rng)).collect();
        assert_eq!(ids.len(), 500);
        let sample = generate_submission_id(now, &mut rng);
        let suffix = sample.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_wire_names() {
        let mut s = InspectionState::new(36);
        save(&mut s, 3, &[IssueTag::Brakes]);
        let rec = assemble(&s, &ctx(), Utc::now()).unwrap();
        let v = serde_json::to_value(&rec).unwrap();
        for key in [
            "submissionId",
            "date",
            "center",
            "timestamp",
            "kartsWithIssues",
            "kartProblems",
            "otherFailures",
            "inspector",
        ] {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(v["kartsWithIssues"], serde_json::json!([3]));
        assert_eq!(v["kartProblems"]["3"]["issues"], serde_json::json!(["brakes"]));
        assert_eq!(v["otherFailures"], "");
    }
}
