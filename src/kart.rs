use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InspectionError;
use crate::i18n::Language;

/// Kart number in the closed range `[1, kart_count]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KartId(u32);

impl KartId {
    pub fn new(number: u32, kart_count: u32) -> Result<Self, InspectionError> {
        if number == 0 || number > kart_count {
            return Err(InspectionError::UnknownKart(number));
        }
        Ok(Self(number))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for KartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KartStatus {
    Untouched,
    /// Flagged, but no non-empty issue list saved yet
    FlaggedPending,
    FlaggedSaved,
}

impl KartStatus {
    pub fn is_flagged(self) -> bool {
        !matches!(self, KartStatus::Untouched)
    }
}

/// Predefined defect categories on the inspection form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTag {
    Brakes,
    Steering,
    Throttle,
    Tires,
    Chain,
    Engine,
    FuelSystem,
    Seat,
    SeatBelt,
    Bumpers,
    Bodywork,
    Pedals,
}

impl IssueTag {
    pub const ALL: [IssueTag; 12] = [
        IssueTag::Brakes,
        IssueTag::Steering,
        IssueTag::Throttle,
        IssueTag::Tires,
        IssueTag::Chain,
        IssueTag::Engine,
        IssueTag::FuelSystem,
        IssueTag::Seat,
        IssueTag::SeatBelt,
        IssueTag::Bumpers,
        IssueTag::Bodywork,
        IssueTag::Pedals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueTag::Brakes => "brakes",
            IssueTag::Steering => "steering",
            IssueTag::Throttle => "throttle",
            IssueTag::Tires => "tires",
            IssueTag::Chain => "chain",
            IssueTag::Engine => "engine",
            IssueTag::FuelSystem => "fuel_system",
            IssueTag::Seat => "seat",
            IssueTag::SeatBelt => "seat_belt",
            IssueTag::Bumpers => "bumpers",
            IssueTag::Bodywork => "bodywork",
            IssueTag::Pedals => "pedals",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (IssueTag::Brakes, Language::En) => "Brakes",
            (IssueTag::Brakes, Language::Nl) => "Remmen",
            (IssueTag::Steering, Language::En) => "Steering",
            (IssueTag::Steering, Language::Nl) => "Besturing",
            (IssueTag::Throttle, Language::En) => "Throttle",
            (IssueTag::Throttle, Language::Nl) => "Gaspedaal",
            (IssueTag::Tires, Language::En) => "Tires",
            (IssueTag::Tires, Language::Nl) => "Banden",
            (IssueTag::Chain, Language::En) => "Chain",
            (IssueTag::Chain, Language::Nl) => "Ketting",
            (IssueTag::Engine, Language::En) => "Engine",
            (IssueTag::Engine, Language::Nl) => "Motor",
            (IssueTag::FuelSystem, Language::En) => "Fuel system",
            (IssueTag::FuelSystem, Language::Nl) => "Brandstofsysteem",
            (IssueTag::Seat, Language::En) => "Seat",
            (IssueTag::Seat, Language::Nl) => "Stoel",
            (IssueTag::SeatBelt, Language::En) => "Seat belt",
            (IssueTag::SeatBelt, Language::Nl) => "Veiligheidsgordel",
            (IssueTag::Bumpers, Language::En) => "Bumpers",
            (IssueTag::Bumpers, Language::Nl) => "Bumpers",
            (IssueTag::Bodywork, Language::En) => "Bodywork",
            (IssueTag::Bodywork, Language::Nl) => "Carrosserie",
            (IssueTag::Pedals, Language::En) => "Pedals",
            (IssueTag::Pedals, Language::Nl) => "Pedalen",
        }
    }
}

/// Problems recorded for one flagged kart. Replaced wholesale on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub issues: BTreeSet<IssueTag>,
    #[serde(rename = "otherFailures", default, with = "note_text")]
    pub note: Option<String>,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

impl ProblemRecord {
    pub fn new(issues: BTreeSet<IssueTag>, note: Option<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            issues,
            note: note.and_then(normalize_note),
            recorded_at,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Trimmed note, `None` when blank.
pub fn normalize_note(s: impl AsRef<str>) -> Option<String> {
    let t = s.as_ref().trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Optional notes travel as plain strings, empty when absent.
pub(crate) mod note_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.and_then(super::normalize_note))
    }
}
