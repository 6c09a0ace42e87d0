use std::collections::BTreeMap;

use crate::kart::{KartId, ProblemRecord};

/// Problem records keyed by flagged kart.
#[derive(Debug, Clone, Default)]
pub struct ProblemLedger {
    records: BTreeMap<KartId, ProblemRecord>,
}

impl ProblemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous record; issue sets are never merged.
    pub fn save(&mut self, kart: KartId, record: ProblemRecord) {
        self.records.insert(kart, record);
    }

    pub fn get(&self, kart: KartId) -> Option<&ProblemRecord> {
        self.records.get(&kart)
    }

    pub fn remove(&mut self, kart: KartId) -> Option<ProblemRecord> {
        self.records.remove(&kart)
    }

    /// A record exists and lists at least one issue.
    pub fn has_complete(&self, kart: KartId) -> bool {
        self.records.get(&kart).map(ProblemRecord::is_complete).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn issue_count(&self) -> usize {
        self.records.values().map(|r| r.issues.len()).sum()
    }

    /// Copy of the records for the given karts only.
    pub fn snapshot<I>(&self, karts: I) -> BTreeMap<KartId, ProblemRecord>
    where
        I: IntoIterator<Item = KartId>,
    {
        karts
            .into_iter()
            .filter_map(|k| self.records.get(&k).map(|r| (k, r.clone())))
            .collect()
    }
}
