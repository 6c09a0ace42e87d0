//! Read-only queries over the local archive: listing, date facets,
//! text search and CSV export.

use std::collections::BTreeSet;

use chrono::Local;
use serde::Serialize;

use crate::archive::LocalArchive;
use crate::i18n::{translate, Language, Text};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::submission::SubmissionRecord;

pub const CSV_HEADER: &str =
    "Date,Center,Karts with Issues,Individual Problems,Other Failures,Inspector,Timestamp";

/// A record as the dashboard table shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRow {
    pub date: String,
    pub center: String,
    pub karts: String,
    pub problems: String,
    pub other_failures: String,
    pub inspector: String,
    pub timestamp: String,
}

impl DashboardRow {
    pub fn render(record: &SubmissionRecord, lang: Language) -> Self {
        let karts = join_numbers(record, ", ");
        let problems = problem_lines(record, lang);
        Self {
            date: record.date.clone(),
            center: record.center_label.clone(),
            karts: format!("{} karts: {}", record.flagged_karts.len(), karts),
            problems: if problems.is_empty() {
                translate(Text::NoSpecificProblems, lang).to_string()
            } else {
                problems.join("; ")
            },
            other_failures: record
                .general_note
                .clone()
                .unwrap_or_else(|| translate(Text::NoneRecorded, lang).to_string()),
            inspector: record.inspector.clone(),
            timestamp: record
                .created_at
                .with_timezone(&Local)
                .format("%d/%m/%Y, %H:%M:%S")
                .to_string(),
        }
    }

    /// Case-insensitive substring match over the searchable columns.
    pub fn matches(&self, needle_lower: &str) -> bool {
        [&self.date, &self.center, &self.karts, &self.problems, &self.other_failures]
            .iter()
            .any(|field| field.to_lowercase().contains(needle_lower))
    }
}

pub struct Dashboard<'a> {
    archive: &'a LocalArchive,
}

impl<'a> Dashboard<'a> {
    pub fn new(archive: &'a LocalArchive) -> Self {
        Self { archive }
    }

    /// Newest first.
    pub fn list(&self) -> Vec<&'a SubmissionRecord> {
        let mut records = self.archive.records();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Ascending, for the date filter.
    pub fn distinct_dates(&self) -> Vec<String> {
        self.archive
            .records()
            .into_iter()
            .map(|r| r.date.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Both predicates must hold; an empty `search` or `date_exact` matches all.
    /// `search` runs against the rows as rendered in `lang`.
    pub fn filter(&self, search: &str, date_exact: &str, lang: Language) -> Vec<&'a SubmissionRecord> {
        let needle = search.to_lowercase();
        let date_exact = date_exact.trim();
        let hits: Vec<_> = self
            .list()
            .into_iter()
            .filter(|r| date_exact.is_empty() || r.date == date_exact)
            .filter(|r| needle.is_empty() || DashboardRow::render(r, lang).matches(&needle))
            .collect();
        log(
            Level::Debug,
            Domain::Dashboard,
            "filter",
            obj(&[
                ("search", v_str(search)),
                ("date", v_str(date_exact)),
                ("lang", v_str(lang.as_str())),
                ("hits", serde_json::json!(hits.len())),
            ]),
        );
        hits
    }

    pub fn rows(&self, records: &[&SubmissionRecord], lang: Language) -> Vec<DashboardRow> {
        records.iter().map(|r| DashboardRow::render(r, lang)).collect()
    }

    /// CSV of the whole archive in archive order.
    pub fn export_all(&self) -> String {
        export_csv(&self.archive.records())
    }
}

/// Header row plus one row per record, rows joined with `\n`.
pub fn export_csv(records: &[&SubmissionRecord]) -> String {
    let mut rows = vec![CSV_HEADER.to_string()];
    for record in records {
        let karts = join_numbers(record, "; ");
        let problems = problem_lines(record, Language::En).join("; ");
        let other = record
            .general_note
            .clone()
            .unwrap_or_else(|| translate(Text::NoneRecorded, Language::En).to_string());
        let created = record
            .created_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let row = [
            plain(&record.date),
            plain(&record.center_label),
            quoted(&karts),
            quoted(&problems),
            quoted(&other),
            plain(&record.inspector),
            plain(&created),
        ];
        rows.push(row.join(","));
    }
    rows.join("\n")
}

/// `kart_checklist_19-10-2026.csv`
pub fn export_filename(date: &str) -> String {
    format!("kart_checklist_{}.csv", date.replace('/', "-"))
}

fn join_numbers(record: &SubmissionRecord, sep: &str) -> String {
    record
        .flagged_karts
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn problem_lines(record: &SubmissionRecord, lang: Language) -> Vec<String> {
    record
        .flagged_karts
        .iter()
        .filter_map(|kart| {
            let rec = record.problems_by_kart.get(kart)?;
            if rec.issues.is_empty() {
                return None;
            }
            let tags: Vec<&str> = rec.issues.iter().map(|t| t.label(lang)).collect();
            let mut line = format!("Kart #{}: {}", kart, tags.join(", "));
            if let Some(note) = &rec.note {
                line.push_str(&format!(" ({})", note));
            }
            Some(line)
        })
        .collect()
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn plain(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        quoted(s)
    } else {
        s.to_string()
    }
}
