//! Note model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

/// Maximum number of characters kept in a derived title
pub const MAX_TITLE_CHARS: usize = 100;

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Markup flavor of a note's content plus free-form parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentKind {
    /// Flavor name, e.g. `semantic-html`, `markdown`, `plain`
    pub name: String,
    /// Flavor parameters (e.g. a schema version)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl ContentKind {
    pub const SEMANTIC_HTML: &'static str = "semantic-html";
    pub const MARKDOWN: &'static str = "markdown";
    pub const PLAIN: &'static str = "plain";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn semantic_html() -> Self {
        Self::new(Self::SEMANTIC_HTML)
    }

    pub fn markdown() -> Self {
        Self::new(Self::MARKDOWN)
    }

    pub fn plain() -> Self {
        Self::new(Self::PLAIN)
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Whether content of this kind is tag markup rather than line text.
    pub fn is_markup(&self) -> bool {
        self.name.eq_ignore_ascii_case(Self::SEMANTIC_HTML)
            || self.name.to_ascii_lowercase().ends_with("html")
    }
}

impl Default for ContentKind {
    fn default() -> Self {
        Self::plain()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.params {
            write!(f, ";{key}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    /// Parses `name;key=value;key=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let name = parts.next().unwrap_or("").trim();
        if name.is_empty() {
            return Err("content kind name must not be empty".to_string());
        }
        let mut kind = Self::new(name);
        for part in parts.filter(|part| !part.trim().is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| format!("invalid content kind parameter '{part}'"))?;
            kind = kind.with_param(key.trim(), value.trim());
        }
        Ok(kind)
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Markup or plain text content
    pub content: String,
    /// Markup flavor of `content`
    #[serde(default)]
    pub kind: ContentKind,
    /// Derived from content, at most `MAX_TITLE_CHARS` characters
    #[serde(default)]
    pub title: String,
    /// Logical ordering value (Unix ms), not a wall-clock authority
    pub date: i64,
    /// Edit protection flag
    #[serde(default)]
    pub is_locked: bool,
    /// Derived search tokens
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl Note {
    /// Create a new note with the given content and kind
    #[must_use]
    pub fn new(content: impl Into<String>, kind: ContentKind) -> Self {
        let mut note = Self {
            id: NoteId::new(),
            content: content.into(),
            kind,
            title: String::new(),
            date: chrono::Utc::now().timestamp_millis(),
            is_locked: false,
            tokens: Vec::new(),
        };
        note.refresh_derived();
        note
    }

    /// Create a new plain text note
    #[must_use]
    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, ContentKind::plain())
    }

    /// Recompute title and search tokens from content.
    pub fn refresh_derived(&mut self) {
        let text = self.visible_text();
        self.title = derive_title(&text);
        self.tokens = search_tokens(&text);
    }

    /// Content with markup tags stripped (for markup kinds).
    pub fn visible_text(&self) -> String {
        if self.kind.is_markup() {
            strip_tags(&self.content)
        } else {
            self.content.clone()
        }
    }

    /// Content length in characters
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Whether two snapshots carry the same user-visible state
    ///
    /// Compares content, date, kind and lock flag; derived fields are ignored.
    pub fn same_fields(&self, other: &Self) -> bool {
        self.content == other.content
            && self.date == other.date
            && self.kind == other.kind
            && self.is_locked == other.is_locked
    }

    /// Short summary of the persisted note
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id,
            title: self.title.clone(),
            date: self.date,
            is_locked: self.is_locked,
        }
    }
}

/// What the editor gets back once a note has been persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub date: i64,
    pub is_locked: bool,
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"))
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w{2,}").expect("Invalid regex"))
}

/// Replace markup tags with line breaks, keeping only text.
fn strip_tags(markup: &str) -> String {
    tag_regex().replace_all(markup, "\n").into_owned()
}

/// First non-blank line, whitespace collapsed, truncated to `MAX_TITLE_CHARS`
fn derive_title(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Extract search tokens from text
///
/// Tokens are words of at least two characters, lowercased, deduplicated and
/// sorted.
///
/// # Examples
///
/// ```
/// use tandem_core::models::search_tokens;
///
/// let tokens = search_tokens("Hello hello World, a rust-lang note");
/// assert_eq!(tokens, vec!["hello", "lang", "note", "rust", "world"]);
/// ```
#[must_use]
pub fn search_tokens(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(text)
        .map(|word| word.as_str().to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
