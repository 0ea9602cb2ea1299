//! Token extraction
//!
//! Helpers that pull embedded tokens out of a raw entry text once its line type is known:
//!
//! - metadata blocks: `[observer; date; time; exclosure; corner]`
//! - corner updates: `<prefix>!<corner>`
//! - insect declarations: `i<digits>: <label> (comment)`
//! - insect references: `i<digits>`
//! - plant positions: `p<digits>`
//! - comments: the first non-empty `( ... )` group
//!
//! Optional tokens come back as `Option`/empty strings; deciding whether absence is an error is
//! left to the classifier.

use crate::trs::context::ObservationMetadata;
use once_cell::sync::Lazy;
use regex::Regex;

/// First `[ ... ]` group; the content is the capture
static BRACKET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?P<content>[^\]]*)\]").unwrap());

/// `i<digits>:` insect declaration marker
static DECLARATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"i(?P<group>[0-9]+):").unwrap());

static INSECT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"i(?P<group>[0-9]+)").unwrap());

static POSITION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"p(?P<position>[0-9]+)").unwrap());

static COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?P<comment>.+?)\)").unwrap());

/// Number of `;`-separated fields in a metadata block
pub const METADATA_FIELDS: usize = 5;

/// An insect index token such as `i3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsectIndex {
    /// The full token, used as the registry key (`i3`)
    pub token: String,
    /// The digits only, written to the `insectGroup` column (`3`)
    pub group: String,
}

impl InsectIndex {
    pub fn from_group(group: &str) -> Self {
        Self {
            token: format!("i{}", group),
            group: group.to_string(),
        }
    }
}

/// A parsed `iN: label (comment)` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsectDeclaration {
    pub index: InsectIndex,
    pub label: String,
    /// Kept for diagnostics only; it is never written to the table
    pub comment: String,
}

/// Result of splitting a metadata block's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMetadata {
    pub metadata: ObservationMetadata,
    /// Fields beyond the fifth, which carry no meaning
    pub ignored_fields: usize,
}

/// Content of the first bracketed group, untrimmed.
pub fn bracket_content(text: &str) -> Option<&str> {
    BRACKET_REGEX
        .captures(text)
        .and_then(|caps| caps.name("content"))
        .map(|m| m.as_str())
}

/// Split bracket content into metadata fields. Returns `None` when fewer than five fields exist.
pub fn parse_metadata(content: &str) -> Option<ParsedMetadata> {
    let fields: Vec<&str> = content.split(';').map(str::trim).collect();
    if fields.len() < METADATA_FIELDS {
        return None;
    }

    Some(ParsedMetadata {
        metadata: ObservationMetadata {
            observer: fields[0].to_string(),
            date: fields[1].to_string(),
            time: fields[2].to_string(),
            exclosure: fields[3].to_string(),
            corner: fields[4].to_string(),
        },
        ignored_fields: fields.len() - METADATA_FIELDS,
    })
}

/// The segment after the first `!`, up to any further `!`, trimmed.
pub fn corner_update(text: &str) -> Option<&str> {
    text.split('!').nth(1).map(str::trim)
}

/// The first parenthetical comment, trimmed, or an empty string when there is none.
pub fn comment(text: &str) -> String {
    COMMENT_REGEX
        .captures(text)
        .and_then(|caps| caps.name("comment"))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// The first `i<digits>` token in the text.
pub fn insect_index(text: &str) -> Option<InsectIndex> {
    INSECT_REGEX
        .captures(text)
        .and_then(|caps| caps.name("group"))
        .map(|m| InsectIndex::from_group(m.as_str()))
}

/// Digits of the first `p<digits>` token in the text.
pub fn position(text: &str) -> Option<&str> {
    POSITION_REGEX
        .captures(text)
        .and_then(|caps| caps.name("position"))
        .map(|m| m.as_str())
}

/// Parse an insect declaration. The label is everything after `iN:` with the first comment
/// removed.
pub fn insect_declaration(text: &str) -> Option<InsectDeclaration> {
    let caps = DECLARATION_REGEX.captures(text)?;
    let group = caps.name("group")?.as_str();
    let rest = &text[caps.get(0)?.end()..];

    let label = COMMENT_REGEX.replacen(rest, 1, "").trim().to_string();

    Some(InsectDeclaration {
        index: InsectIndex::from_group(group),
        label,
        comment: comment(rest),
    })
}

/// Text following the declaration marker, if the line has one.
pub(crate) fn declaration_remainder(text: &str) -> Option<&str> {
    DECLARATION_REGEX.find(text).map(|m| &text[m.end()..])
}
