use url::Url;

use crate::i18n::Language;

#[derive(Debug, Clone)]
pub struct Config {
    /// Highest kart number; karts are numbered 1..=kart_count
    pub kart_count: u32,
    pub center_label: String,
    pub inspector: String,
    pub archive_path: String,
    /// Read the archive file back at startup instead of starting fresh
    pub reload_archive: bool,
    pub sync_url: Option<Url>,
    pub reset_delay_ms: u64,
    pub sync_failure_grace_ms: u64,
    pub notice_ttl_ms: u64,
    pub language: Language,
    pub serve_host: String,
    pub serve_port: u16,
    pub serve_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kart_count: 36,
            center_label: "Gent 2025".to_string(),
            inspector: "User".to_string(),
            archive_path: "./kartChecklistData.json".to_string(),
            reload_archive: false,
            sync_url: None,
            reset_delay_ms: 3000,
            sync_failure_grace_ms: 1000,
            notice_ttl_ms: 5000,
            language: Language::En,
            serve_host: "127.0.0.1".to_string(),
            serve_port: 8000,
            serve_root: ".".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            kart_count: std::env::var("KART_COUNT").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(d.kart_count),
            center_label: std::env::var("CENTER_LABEL").unwrap_or(d.center_label),
            inspector: std::env::var("INSPECTOR").unwrap_or(d.inspector),
            archive_path: std::env::var("ARCHIVE_PATH").unwrap_or(d.archive_path),
            reload_archive: std::env::var("RELOAD_ARCHIVE").map(|v| parse_flag(&v)).unwrap_or(d.reload_archive),
            sync_url: std::env::var("SYNC_URL").ok().and_then(|v| Url::parse(&v).ok()),
            reset_delay_ms: std::env::var("RESET_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.reset_delay_ms),
            sync_failure_grace_ms: std::env::var("SYNC_FAILURE_GRACE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.sync_failure_grace_ms),
            notice_ttl_ms: std::env::var("NOTICE_TTL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.notice_ttl_ms),
            language: std::env::var("LANGUAGE").ok().and_then(|v| Language::parse(&v)).unwrap_or(d.language),
            serve_host: std::env::var("SERVE_HOST").unwrap_or(d.serve_host),
            serve_port: std::env::var("SERVE_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.serve_port),
            serve_root: std::env::var("SERVE_ROOT").unwrap_or(d.serve_root),
        }
    }

    pub fn serve_addr(&self) -> String {
        format!("{}:{}", self.serve_host, self.serve_port)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")
}
