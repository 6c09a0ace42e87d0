//! English/Dutch labels and user messages.
//!
//! `translate` covers every fixed label; `Message` covers the notices that
//! carry kart numbers or ids. Both are pure lookups on the current
//! `Language`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::kart::KartId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Nl,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Some(Language::En),
            "nl" => Some(Language::Nl),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Language::En => Language::Nl,
            Language::Nl => Language::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
        }
    }
}

/// Fixed interface labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Text {
    AppTitle,
    CurrentDate,
    KartGridHeading,
    SelectedKartsHeading,
    NoSelection,
    StatusSaved,
    StatusNeedsProblems,
    EditorHeading,
    KartNoteHeading,
    KartNotePlaceholder,
    GeneralNoteHeading,
    GeneralNotePlaceholder,
    SaveProblems,
    ClearProblems,
    SubmitAll,
    ClearAll,
    ViewDashboard,
    BackToChecklist,
    SearchPlaceholder,
    AllDates,
    ExportData,
    NoDashboardData,
    NoSpecificProblems,
    NoneRecorded,
    SuccessTitle,
    SubmittedKarts,
    IssuesFound,
    SubmissionId,
    LanguageToggle,
}

impl Text {
    pub const ALL: [Text; 29] = [
        Text::AppTitle,
        Text::CurrentDate,
        Text::KartGridHeading,
        Text::SelectedKartsHeading,
        Text::NoSelection,
        Text::StatusSaved,
        Text::StatusNeedsProblems,
        Text::EditorHeading,
        Text::KartNoteHeading,
        Text::KartNotePlaceholder,
        Text::GeneralNoteHeading,
        Text::GeneralNotePlaceholder,
        Text::SaveProblems,
        Text::ClearProblems,
        Text::SubmitAll,
        Text::ClearAll,
        Text::ViewDashboard,
        Text::BackToChecklist,
        Text::SearchPlaceholder,
        Text::AllDates,
        Text::ExportData,
        Text::NoDashboardData,
        Text::NoSpecificProblems,
        Text::NoneRecorded,
        Text::SuccessTitle,
        Text::SubmittedKarts,
        Text::IssuesFound,
        Text::SubmissionId,
        Text::LanguageToggle,
    ];
}

pub fn translate(key: Text, lang: Language) -> &'static str {
    use Language::*;
    match (key, lang) {
        (Text::AppTitle, En) => "Kart Check",
        (Text::AppTitle, Nl) => "Kart Controle",
        (Text::CurrentDate, En) => "Date",
        (Text::CurrentDate, Nl) => "Datum",
        (Text::KartGridHeading, En) => "Select karts with issues",
        (Text::KartGridHeading, Nl) => "Selecteer karts met problemen",
        (Text::SelectedKartsHeading, En) => "Karts with issues",
        (Text::SelectedKartsHeading, Nl) => "Karts met problemen",
        (Text::NoSelection, En) => {
            "No karts selected yet. Click on kart numbers above to mark them as having issues."
        }
        (Text::NoSelection, Nl) => {
            "Nog geen karts geselecteerd. Klik op de kartnummers hierboven om problemen te markeren."
        }
        (Text::StatusSaved, En) => "Problems saved",
        (Text::StatusSaved, Nl) => "Problemen opgeslagen",
        (Text::StatusNeedsProblems, En) => "Needs problems",
        (Text::StatusNeedsProblems, Nl) => "Problemen nodig",
        (Text::EditorHeading, En) => "Problems for Kart #",
        (Text::EditorHeading, Nl) => "Problemen voor Kart #",
        (Text::KartNoteHeading, En) => "Other failures for Kart #",
        (Text::KartNoteHeading, Nl) => "Andere storingen voor Kart #",
        (Text::KartNotePlaceholder, En) => "Describe any other problems with this kart...",
        (Text::KartNotePlaceholder, Nl) => "Beschrijf andere problemen met deze kart...",
        (Text::GeneralNoteHeading, En) => "General failures",
        (Text::GeneralNoteHeading, Nl) => "Algemene storingen",
        (Text::GeneralNotePlaceholder, En) => "Describe any general failures...",
        (Text::GeneralNotePlaceholder, Nl) => "Beschrijf algemene storingen...",
        (Text::SaveProblems, En) => "Save problems",
        (Text::SaveProblems, Nl) => "Problemen opslaan",
        (Text::ClearProblems, En) => "Clear kart",
        (Text::ClearProblems, Nl) => "Kart wissen",
        (Text::SubmitAll, En) => "Submit checklist",
        (Text::SubmitAll, Nl) => "Checklist versturen",
        (Text::ClearAll, En) => "Clear all",
        (Text::ClearAll, Nl) => "Alles wissen",
        (Text::ViewDashboard, En) => "View dashboard",
        (Text::ViewDashboard, Nl) => "Dashboard bekijken",
        (Text::BackToChecklist, En) => "Back to checklist",
        (Text::BackToChecklist, Nl) => "Terug naar checklist",
        (Text::SearchPlaceholder, En) => "Search by date, karts, or issues...",
        (Text::SearchPlaceholder, Nl) => "Zoek op datum, karts of problemen...",
        (Text::AllDates, En) => "All Dates",
        (Text::AllDates, Nl) => "Alle datums",
        (Text::ExportData, En) => "Export Data",
        (Text::ExportData, Nl) => "Gegevens exporteren",
        (Text::NoDashboardData, En) => "No checklist data available yet.",
        (Text::NoDashboardData, Nl) => "Nog geen checklistgegevens beschikbaar.",
        (Text::NoSpecificProblems, En) => "No specific problems recorded",
        (Text::NoSpecificProblems, Nl) => "Geen specifieke problemen geregistreerd",
        (Text::NoneRecorded, En) => "None",
        (Text::NoneRecorded, Nl) => "Geen",
        (Text::SuccessTitle, En) => "Checklist submitted!",
        (Text::SuccessTitle, Nl) => "Checklist verstuurd!",
        (Text::SubmittedKarts, En) => "Karts submitted",
        (Text::SubmittedKarts, Nl) => "Karts verstuurd",
        (Text::IssuesFound, En) => "Issues found",
        (Text::IssuesFound, Nl) => "Problemen gevonden",
        (Text::SubmissionId, En) => "Submission ID",
        (Text::SubmissionId, Nl) => "Inzending-ID",
        // The toggle advertises the other language.
        (Text::LanguageToggle, En) => "🇳🇱 NL",
        (Text::LanguageToggle, Nl) => "🇬🇧 EN",
    }
}

/// User-facing notices that embed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    EditBlocked(KartId),
    NoKartInEdit,
    ProblemsSaved(KartId),
    KartCleared(KartId),
    AllCleared,
    NothingToSubmit,
    NoKartsSelected,
    IncompleteKarts(Vec<KartId>),
    SavedLocallyOnly,
    ArchiveWriteFailed,
    ExportWritten { path: String, rows: usize },
    ExportFailed { path: String },
    UnknownKart(u32),
}

impl Message {
    pub fn render(&self, lang: Language) -> String {
        use Language::*;
        match (self, lang) {
            (Message::EditBlocked(k), En) => format!(
                "Please complete the checklist for Kart #{} before selecting another kart.",
                k
            ),
            (Message::EditBlocked(k), Nl) => format!(
                "Voltooi eerst de checklist voor Kart #{} voordat je een andere kart selecteert.",
                k
            ),
            (Message::NoKartInEdit, En) => "No kart selected for editing.".to_string(),
            (Message::NoKartInEdit, Nl) => "Geen kart geselecteerd voor bewerken.".to_string(),
            (Message::ProblemsSaved(k), En) => format!("Problems saved for Kart #{}", k),
            (Message::ProblemsSaved(k), Nl) => format!("Problemen opgeslagen voor Kart #{}", k),
            (Message::KartCleared(k), En) => {
                format!("Kart #{} cleared and removed from issues list.", k)
            }
            (Message::KartCleared(k), Nl) => {
                format!("Kart #{} gewist en verwijderd uit problemen lijst.", k)
            }
            (Message::AllCleared, En) => "All selections cleared.".to_string(),
            (Message::AllCleared, Nl) => "Alle selecties gewist.".to_string(),
            (Message::NothingToSubmit, En) => "⚠️ Please fill in some information before submitting. Select karts with issues or add general failures.".to_string(),
            (Message::NothingToSubmit, Nl) => "⚠️ Vul eerst wat informatie in voordat u verstuurt. Selecteer karts met problemen of voeg algemene storingen toe.".to_string(),
            (Message::NoKartsSelected, En) => {
                "⚠️ Please select at least one kart with issues before submitting.".to_string()
            }
            (Message::NoKartsSelected, Nl) => {
                "⚠️ Selecteer ten minste één kart met problemen voordat u verstuurt.".to_string()
            }
            (Message::IncompleteKarts(karts), En) => {
                format!("Please define problems for karts: {}", join_karts(karts))
            }
            (Message::IncompleteKarts(karts), Nl) => {
                format!("Definieer problemen voor karts: {}", join_karts(karts))
            }
            (Message::SavedLocallyOnly, En) => {
                "Data saved locally. Please check Google Sheets setup.".to_string()
            }
            (Message::SavedLocallyOnly, Nl) => {
                "Data lokaal opgeslagen. Controleer Google Sheets instellingen.".to_string()
            }
            (Message::ArchiveWriteFailed, En) => {
                "Could not write the local archive. This submission is not saved on disk.".to_string()
            }
            (Message::ArchiveWriteFailed, Nl) => {
                "Lokaal archief kon niet worden geschreven. Deze inzending is niet op schijf opgeslagen.".to_string()
            }
            (Message::ExportWritten { path, rows }, En) => {
                format!("Exported {} submissions to {}", rows, path)
            }
            (Message::ExportWritten { path, rows }, Nl) => {
                format!("{} inzendingen geëxporteerd naar {}", rows, path)
            }
            (Message::ExportFailed { path }, En) => format!("Export to {} failed.", path),
            (Message::ExportFailed { path }, Nl) => format!("Exporteren naar {} mislukt.", path),
            (Message::UnknownKart(n), En) => format!("Kart #{} does not exist.", n),
            (Message::UnknownKart(n), Nl) => format!("Kart #{} bestaat niet.", n),
        }
    }
}

fn join_karts(karts: &[KartId]) -> String {
    karts
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// en-GB renders `19/10/2026`, nl-NL renders `19-10-2026` without padding.
pub fn format_date(date: NaiveDate, lang: Language) -> String {
    match lang {
        Language::En => date.format("%d/%m/%Y").to_string(),
        Language::Nl => format!("{}-{}-{}", date.day(), date.month(), date.year()),
    }
}

pub fn today(lang: Language) -> String {
    format_date(chrono::Local::now().date_naive(), lang)
}
