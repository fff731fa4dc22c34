//! Tokens compared by the structural merge

/// Tag names that never carry a close tag
const SELF_CLOSING: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Leaf tags that count as content on their own
const CONTENTFUL_TAGS: &[&str] = &["img", "hr", "input", "embed", "iframe", "video", "audio"];

pub fn is_self_closing(name: &str) -> bool {
    SELF_CLOSING.contains(&name)
}

/// An attribute as it appeared on its tag (lowercased name, raw value)
pub type Attribute = (String, String);

/// Smallest unit the merge compares
#[derive(Debug, Clone, Eq)]
pub enum Token {
    /// A text run, or one line in line mode
    Text(String),
    Open {
        name: String,
        attributes: Vec<Attribute>,
    },
    Close {
        name: String,
    },
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn open(name: impl Into<String>) -> Self {
        Self::Open {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn close(name: impl Into<String>) -> Self {
        Self::Close { name: name.into() }
    }

    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Text, or a leaf tag such as an image or a rule
    pub fn is_contentful(&self) -> bool {
        match self {
            Self::Text(_) => true,
            Self::Open { name, .. } => CONTENTFUL_TAGS.contains(&name.as_str()),
            Self::Close { .. } => false,
        }
    }
}

impl PartialEq for Token {
    /// Same text, or same tag name with the same attribute map (order ignored)
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (
                Self::Open {
                    name: a_name,
                    attributes: a_attrs,
                },
                Self::Open {
                    name: b_name,
                    attributes: b_attrs,
                },
            ) => {
                a_name == b_name
                    && a_attrs.len() == b_attrs.len()
                    && a_attrs.iter().all(|attr| b_attrs.contains(attr))
            }
            (Self::Close { name: a }, Self::Close { name: b }) => a == b,
            _ => false,
        }
    }
}
