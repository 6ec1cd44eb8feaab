//! Frontmatter codec for idea files.
//!
//! Idea files start with a delimited metadata header:
//! ```text
//! ---
//! id: "5b0c2f6e-0d5e-4c43-9a55-1d6f0c9c1f11"
//! title: "Community orchard"
//! tags: ["garden","community"]
//! connections: ["Seed library"]
//! created: "2024-05-01T10:00:00Z"
//! ---
//!
//! The refined idea body.
//! ```
//!
//! Decoding never fails: text without a well-formed header decodes to `None`
//! and callers skip it. Keys are not checked against a schema; anything the
//! typed [`IdeaFrontMatter`] does not know is carried in its `extra` map and
//! written back out on encode.

use crate::models::{Idea, IdeaId};
use chrono::{DateTime, Utc};

/// A single header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A quoted string.
    Text(String),
    /// A bracketed JSON array of strings.
    List(Vec<String>),
    /// Any other scalar, written bare.
    Raw(String),
}

impl FieldValue {
    /// Returns the value as a single string, if it is scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Raw(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Returns the value as a list. Scalars become a one-element list unless
    /// they are blank.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(s) | Self::Raw(s) if s.trim().is_empty() => Vec::new(),
            Self::Text(s) | Self::Raw(s) => vec![s.clone()],
        }
    }

    fn encode(&self) -> String {
        match self {
            Self::Text(s) => quote(s),
            Self::List(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
            },
            Self::Raw(s) => s.clone(),
        }
    }

    fn decode(raw: &str) -> Self {
        if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
            return Self::List(parse_list(raw));
        }
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            let unquoted = serde_json::from_str::<String>(raw)
                .unwrap_or_else(|_| raw[1..raw.len() - 1].to_string());
            return Self::Text(unquoted);
        }
        Self::Raw(raw.to_string())
    }
}

/// Ordered header fields.
pub type Fields = Vec<(String, FieldValue)>;

/// Codec for the delimited header.
pub struct FrontMatter;

impl FrontMatter {
    /// The header delimiter line.
    const DELIMITER: &'static str = "---";

    /// Key/value separator within a header line.
    const SEPARATOR: &'static str = ": ";

    /// Encodes header fields followed by the body.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use santra::storage::frontmatter::{FieldValue, FrontMatter};
    ///
    /// let fields = vec![("title".to_string(), FieldValue::Text("Orchard".to_string()))];
    /// let text = FrontMatter::encode(&fields, "Body");
    /// assert_eq!(text, "---\ntitle: \"Orchard\"\n---\n\nBody");
    /// ```
    #[must_use]
    pub fn encode(fields: &[(String, FieldValue)], body: &str) -> String {
        let mut out = String::with_capacity(body.len() + 64 * fields.len());
        out.push_str(Self::DELIMITER);
        out.push('\n');
        for (key, value) in fields {
            out.push_str(key);
            out.push_str(Self::SEPARATOR);
            out.push_str(&value.encode());
            out.push('\n');
        }
        out.push_str(Self::DELIMITER);
        out.push_str("\n\n");
        out.push_str(body);
        out
    }

    /// Decodes a header and body.
    ///
    /// Returns `None` when the text does not begin with the delimiter line or
    /// has no closing delimiter line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use santra::storage::frontmatter::{FieldValue, FrontMatter};
    ///
    /// let (fields, body) = FrontMatter::decode("---\ntags: [\"a\"]\n---\n\nBody").unwrap();
    /// assert_eq!(fields[0].1, FieldValue::List(vec!["a".to_string()]));
    /// assert_eq!(body, "Body");
    ///
    /// assert!(FrontMatter::decode("no header").is_none());
    /// ```
    #[must_use]
    pub fn decode(text: &str) -> Option<(Fields, String)> {
        let rest = text.strip_prefix(Self::DELIMITER)?;
        let rest = strip_line_break(rest)?;

        let mut fields = Vec::new();
        let mut remaining = rest;
        loop {
            let (line, after) = match remaining.find('\n') {
                Some(pos) => (&remaining[..pos], Some(&remaining[pos + 1..])),
                None => (remaining, None),
            };
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line == Self::DELIMITER {
                let body = after.unwrap_or("");
                let body = strip_line_break(body).unwrap_or(body);
                return Some((fields, body.to_string()));
            }

            if let Some((key, value)) = line.split_once(Self::SEPARATOR) {
                fields.push((key.trim().to_string(), FieldValue::decode(value.trim())));
            }

            remaining = after?;
        }
    }

    /// Returns the body without its header, or the whole text when there is
    /// no header.
    #[must_use]
    pub fn extract_body(text: &str) -> String {
        Self::decode(text).map_or_else(|| text.to_string(), |(_, body)| body)
    }
}

fn strip_line_break(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

fn parse_list(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Typed view over an idea file header.
///
/// Known keys are named fields; unknown keys are kept in `extra` in the
/// order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaFrontMatter {
    /// Idea identifier.
    pub id: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Connection references.
    pub connections: Vec<String>,
    /// Creation timestamp as written.
    pub created: Option<String>,
    /// Last rewrite timestamp as written.
    pub modified: Option<String>,
    /// Raw input text.
    pub original: Option<String>,
    /// Provenance tag.
    pub source: Option<String>,
    /// Keys without a typed field.
    pub extra: Fields,
}

impl IdeaFrontMatter {
    /// Builds the typed view from decoded fields.
    #[must_use]
    pub fn from_fields(fields: Fields) -> Self {
        let mut fm = Self::default();
        for (key, value) in fields {
            let text = || value.as_text().map(str::to_string);
            match key.as_str() {
                "id" => fm.id = text(),
                "title" => fm.title = text(),
                "tags" => fm.tags = value.to_list(),
                "connections" => fm.connections = value.to_list(),
                "created" => fm.created = text(),
                "modified" => fm.modified = text(),
                "original" => fm.original = text(),
                "source" => fm.source = text(),
                _ => fm.extra.push((key, value)),
            }
        }
        fm
    }

    /// Returns the header fields in canonical order, unknown keys last.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Vec::with_capacity(8 + self.extra.len());
        let mut text = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                fields.push((key.to_string(), FieldValue::Text(v.clone())));
            }
        };
        text("id", &self.id);
        text("title", &self.title);
        text("created", &self.created);
        text("modified", &self.modified);
        text("original", &self.original);
        text("source", &self.source);
        fields.push(("tags".to_string(), FieldValue::List(self.tags.clone())));
        fields.push((
            "connections".to_string(),
            FieldValue::List(self.connections.clone()),
        ));
        fields.extend(self.extra.iter().cloned());
        fields
    }

    /// Builds the header for an idea.
    #[must_use]
    pub fn from_idea(idea: &Idea) -> Self {
        Self {
            id: Some(idea.id.as_str().to_string()),
            title: Some(idea.title.clone()),
            tags: idea.tags.clone(),
            connections: idea.connections.clone(),
            created: Some(idea.created.to_rfc3339()),
            modified: idea.modified.map(|m| m.to_rfc3339()),
            original: Some(idea.original.clone()),
            source: Some(idea.source.clone()),
            extra: Vec::new(),
        }
    }

    /// Reconstructs an idea from the header and body.
    ///
    /// `fallback_id` is used when the header has no id (the file stem), and
    /// `fallback_created` when `created` is missing or unparseable.
    #[must_use]
    pub fn into_idea(self, fallback_id: &str, fallback_created: DateTime<Utc>, body: String) -> Idea {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        Idea {
            id: IdeaId::new(id),
            title,
            content: body,
            tags: self.tags,
            connections: self.connections,
            created: self
                .created
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(fallback_created),
            modified: self.modified.as_deref().and_then(parse_timestamp),
            original: self.original.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
