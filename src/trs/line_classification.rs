//! Line Classification
//!
//! Core classification logic for determining the type of a transcript entry from its raw text.
//!
//! Classification follows this specific order (important for correctness, first match wins):
//! 1. Metadata block (`[...]`), or an end marker block (`[end]`, `[END]`)
//! 2. Corner update (contains `!`)
//! 3. Insect declaration (`iN:` followed by a label that is not a behavior)
//! 4. Search (contains `search`)
//! 5. Exit (contains `exit`)
//! 6. Lost (contains `lost`)
//! 7. Scan (`scan` followed by whitespace)
//! 8. Land (`land` followed by whitespace)
//! 9. Default to unrecognized
//!
//! Earlier rules shadow later ones: a metadata block that happens to mention "exit" is still
//! metadata. The text is classified untrimmed; the trailing newline a transcript entry carries is
//! what lets a line ending in `scan` or `land` satisfy the whitespace requirement.

use crate::trs::extraction::{bracket_content, declaration_remainder};
use once_cell::sync::Lazy;
use regex::Regex;

static SCAN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"scan\s").unwrap());

static LAND_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"land\s").unwrap());

/// A declaration label starting with one of these is an event written with a colon
static BEHAVIOR_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(search|exit|lost|scan|land)\b").unwrap());

/// The kind of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// `[end]`-style block closing an observation
    EndMarker,
    Metadata,
    CornerUpdate,
    InsectDeclaration,
    Search,
    Exit,
    /// Recorded as an exit in the output
    Lost,
    Scan,
    Land,
    Unrecognized,
}

/// Determine the type of an entry based on its text.
///
/// `end_markers` are the exact bracket contents (untrimmed, case-sensitive) that close an
/// observation instead of opening one.
pub fn classify_line<S: AsRef<str>>(text: &str, end_markers: &[S]) -> LineType {
    if let Some(content) = bracket_content(text) {
        if end_markers.iter().any(|marker| marker.as_ref() == content) {
            return LineType::EndMarker;
        }
        return LineType::Metadata;
    }

    if text.contains('!') {
        return LineType::CornerUpdate;
    }

    if is_insect_declaration(text) {
        return LineType::InsectDeclaration;
    }

    if text.contains("search") {
        return LineType::Search;
    }

    if text.contains("exit") {
        return LineType::Exit;
    }

    if text.contains("lost") {
        return LineType::Lost;
    }

    if SCAN_REGEX.is_match(text) {
        return LineType::Scan;
    }

    if LAND_REGEX.is_match(text) {
        return LineType::Land;
    }

    LineType::Unrecognized
}

/// Check if the line declares an insect: `iN:` whose label is not itself a behavior keyword
fn is_insect_declaration(text: &str) -> bool {
    match declaration_remainder(text) {
        Some(rest) => !BEHAVIOR_LABEL_REGEX.is_match(rest),
        None => false,
    }
}
