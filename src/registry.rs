use std::collections::BTreeSet;

use crate::error::InspectionError;
use crate::kart::KartId;

/// Fixed kart universe plus the set of karts flagged as having issues.
#[derive(Debug, Clone)]
pub struct KartRegistry {
    kart_count: u32,
    flagged: BTreeSet<KartId>,
}

impl KartRegistry {
    pub fn new(kart_count: u32) -> Self {
        Self { kart_count, flagged: BTreeSet::new() }
    }

    pub fn kart_count(&self) -> u32 {
        self.kart_count
    }

    pub fn kart(&self, number: u32) -> Result<KartId, InspectionError> {
        KartId::new(number, self.kart_count)
    }

    pub fn all(&self) -> impl Iterator<Item = KartId> + '_ {
        (1..=self.kart_count).filter_map(move |n| KartId::new(n, self.kart_count).ok())
    }

    /// Returns true when the kart was not flagged before.
    pub fn flag(&mut self, kart: KartId) -> bool {
        self.flagged.insert(kart)
    }

    pub fn unflag(&mut self, kart: KartId) -> bool {
        self.flagged.remove(&kart)
    }

    pub fn is_flagged(&self, kart: KartId) -> bool {
        self.flagged.contains(&kart)
    }

    /// Flagged karts, ascending.
    pub fn flagged(&self) -> impl Iterator<Item = KartId> + '_ {
        self.flagged.iter().copied()
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    pub fn clear(&mut self) {
        self.flagged.clear();
    }
}
