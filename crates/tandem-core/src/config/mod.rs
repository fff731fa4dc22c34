//! Sync configuration.
//!
//! Provides `SyncSettings`, the tunables shared by the write queue, the
//! notifier and note validation. Settings come from defaults, an optional JSON
//! document, and environment overrides, in that order.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ContentKind;
use crate::util::normalize_text_option;

const DEFAULT_WRITE_COOLDOWN_MS: u64 = 1_000;
const DEFAULT_MAX_CONTENT_CHARS: usize = 500_000;
const DEFAULT_MARKUP_MAX_CONTENT_CHARS: usize = 1_000_000;

pub const ENV_WRITE_COOLDOWN_MS: &str = "TANDEM_WRITE_COOLDOWN_MS";
pub const ENV_MAX_CONTENT_CHARS: &str = "TANDEM_MAX_CONTENT_CHARS";

/// Tunables for the sync subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Wait after each physical write before draining the same note again
    pub write_cooldown_ms: u64,
    /// Per content kind maximum content length, in characters
    pub max_content_chars: BTreeMap<String, usize>,
    /// Maximum for kinds missing from `max_content_chars`
    pub default_max_content_chars: usize,
    pub notice_backoff: BackoffSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let max_content_chars = BTreeMap::from([
            (
                ContentKind::SEMANTIC_HTML.to_string(),
                DEFAULT_MARKUP_MAX_CONTENT_CHARS,
            ),
            (ContentKind::MARKDOWN.to_string(), DEFAULT_MAX_CONTENT_CHARS),
            (ContentKind::PLAIN.to_string(), DEFAULT_MAX_CONTENT_CHARS),
        ]);
        Self {
            write_cooldown_ms: DEFAULT_WRITE_COOLDOWN_MS,
            max_content_chars,
            default_max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            notice_backoff: BackoffSettings::default(),
        }
    }
}

impl SyncSettings {
    /// Parse settings from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(payload)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `TANDEM_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = normalize_text_option(lookup(ENV_WRITE_COOLDOWN_MS)) {
            self.write_cooldown_ms = parse_number(ENV_WRITE_COOLDOWN_MS, &raw)?;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_MAX_CONTENT_CHARS)) {
            self.default_max_content_chars = parse_number(ENV_MAX_CONTENT_CHARS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub const fn write_cooldown(&self) -> Duration {
        Duration::from_millis(self.write_cooldown_ms)
    }

    /// Maximum content length for a content kind
    pub fn max_content_chars(&self, kind: &ContentKind) -> usize {
        self.max_content_chars
            .get(&kind.name)
            .copied()
            .unwrap_or(self.default_max_content_chars)
    }

    fn validate(&self) -> Result<()> {
        if self.default_max_content_chars == 0 {
            return Err(Error::InvalidInput(
                "default_max_content_chars must be greater than zero".to_string(),
            ));
        }
        if let Some((kind, _)) = self.max_content_chars.iter().find(|(_, max)| **max == 0) {
            return Err(Error::InvalidInput(format!(
                "max_content_chars for '{kind}' must be greater than zero"
            )));
        }
        self.notice_backoff.validate()
    }
}

/// Pacing of repeated transient-error notices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffSettings {
    /// Minimum gap between the first and second notice
    pub initial_ms: u64,
    /// Upper bound for the gap
    pub max_ms: u64,
    /// Error-free time after which the gap resets
    pub quiet_period_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_ms: 5_000,
            max_ms: 300_000,
            quiet_period_ms: 600_000,
        }
    }
}

impl BackoffSettings {
    pub const fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    pub const fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.initial_ms > self.max_ms {
            return Err(Error::InvalidInput(format!(
                "notice_backoff.initial_ms ({}) must not exceed max_ms ({})",
                self.initial_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a non-negative integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_kinds() {
        let settings = SyncSettings::default();
        assert_eq!(settings.write_cooldown(), Duration::from_secs(1));
        assert_eq!(
            settings.max_content_chars(&ContentKind::semantic_html()),
            1_000_000
        );
        assert_eq!(
            settings.max_content_chars(&ContentKind::new("org-mode")),
            500_000
        );
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let settings = SyncSettings::from_json_str(r#"{ "write_cooldown_ms": 50 }"#).unwrap();
        assert_eq!(settings.write_cooldown_ms, 50);
        assert_eq!(settings.notice_backoff, BackoffSettings::default());
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let error = SyncSettings::from_json_str(r#"{ "cooldown": 50 }"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn json_rejects_inverted_backoff() {
        let payload = r#"{ "notice_backoff": { "initial_ms": 10, "max_ms": 5 } }"#;
        assert!(SyncSettings::from_json_str(payload).is_err());
    }

    #[test]
    fn overrides_replace_values() {
        let settings = SyncSettings::default()
            .with_overrides(|key| match key {
                ENV_WRITE_COOLDOWN_MS => Some(" 25 ".to_string()),
                ENV_MAX_CONTENT_CHARS => Some("10".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.write_cooldown_ms, 25);
        assert_eq!(settings.default_max_content_chars, 10);

        let invalid =
            SyncSettings::default().with_overrides(|_| Some("soon".to_string()));
        assert!(invalid.is_err());
    }
}
