//! Transcript reading
//!
//! Turns Transcriber `.trs` markup into an ordered list of [`TranscriptEntry`] values.
//!
//! Transcriber marks each utterance boundary with an empty `Sync` tag carrying a `time`
//! attribute, followed by the transcribed text:
//!
//!     <Turn startTime="0" endTime="41.2">
//!     <Sync time="0"/>
//!     [Alice; 2020-05-01; 09:00; ex1; NE]
//!     <Sync time="3.215"/>
//!     i1: honeybee
//!     </Turn>
//!
//! The markup is parsed leniently with html5ever into an `RcDom`, the same way a tag-soup parser
//! would read it. An HTML tree builder does not honour self-closing unknown tags, so consecutive
//! `Sync` elements end up nested inside each other; the text belonging to a `Sync` is therefore
//! taken as the node that follows its start tag in document order rather than from its children
//! or siblings.

use crate::trs::config::TranscriptConfig;
use crate::trs::error::{ConvertError, Result};
use encoding_rs::{Encoding, UTF_8};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// `encoding="..."` in a leading XML declaration
static DECLARED_ENCODING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["'](?P<label>[A-Za-z0-9._:-]+)["']"#)
        .unwrap()
});

/// A timestamped piece of transcript text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Position among all entries, starting at 0
    pub index: usize,
    /// Literal value of the `time` attribute
    pub timestamp: String,
    /// Raw text following the tag, untrimmed. Empty when an element follows the tag directly.
    pub text: String,
}

/// Read and parse a transcript file, decoding it with the encoding its XML declaration names.
pub fn read_transcript(
    path: impl AsRef<Path>,
    config: &TranscriptConfig,
) -> Result<Vec<TranscriptEntry>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    let source = decode_transcript(&bytes)?;

    let entries = parse_transcript(&source, config)?;
    info!(path = %path.display(), entries = entries.len(), "read transcript");
    Ok(entries)
}

/// Decode raw transcript bytes.
///
/// A byte-order mark wins over the XML declaration; with neither, the bytes must be UTF-8.
/// Nothing is replaced: bytes that are invalid in the chosen encoding are an error.
pub fn decode_transcript(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => (encoding, &bytes[bom_length..]),
        None => (declared_encoding(bytes)?.unwrap_or(UTF_8), bytes),
    };
    debug!(encoding = encoding.name(), "decoding transcript");

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| {
            ConvertError::MalformedTranscript(format!(
                "transcript is not valid {}",
                encoding.name()
            ))
        })
}

fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    let Some(label) = DECLARED_ENCODING_REGEX
        .captures(bytes)
        .and_then(|caps| caps.name("label"))
    else {
        return Ok(None);
    };

    Encoding::for_label(label.as_bytes()).map(Some).ok_or_else(|| {
        ConvertError::MalformedTranscript(format!(
            "unknown encoding '{}' in XML declaration",
            String::from_utf8_lossy(label.as_bytes())
        ))
    })
}

/// Parse transcript markup held in memory.
pub fn parse_transcript(source: &str, config: &TranscriptConfig) -> Result<Vec<TranscriptEntry>> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(source);
    collect_entries(&dom, config)
}

fn collect_entries(dom: &RcDom, config: &TranscriptConfig) -> Result<Vec<TranscriptEntry>> {
    let nodes = document_order(&dom.document);
    let mut entries = Vec::new();

    for (position, node) in nodes.iter().enumerate() {
        if !is_element_named(node, &config.entry_tag) {
            continue;
        }

        let index = entries.len();
        let timestamp = attribute(node, &config.time_attribute).ok_or_else(|| {
            ConvertError::MalformedTranscript(format!(
                "<{}> entry #{} has no '{}' attribute",
                config.entry_tag, index, config.time_attribute
            ))
        })?;
        let text = nodes
            .get(position + 1)
            .and_then(text_content)
            .unwrap_or_default();

        debug!(index, timestamp = %timestamp, "transcript entry");
        entries.push(TranscriptEntry {
            index,
            timestamp,
            text,
        });
    }

    Ok(entries)
}

/// Flatten the tree into pre-order. Iterative since `Sync` nesting grows with transcript length.
fn document_order(root: &Handle) -> Vec<Handle> {
    let mut nodes = Vec::new();
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
        nodes.push(node);
    }

    nodes
}

fn is_element_named(node: &Handle, tag: &str) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => (*name.local).eq_ignore_ascii_case(tag),
        _ => false,
    }
}

fn attribute(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| (*attr.name.local).eq_ignore_ascii_case(attr_name))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

fn text_content(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trs::config::load_defaults;

    fn config() -> TranscriptConfig {
        load_defaults().unwrap().transcript
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<!DOCTYPE Trans SYSTEM "trans-14.dtd">
<Trans scribe="bjs" version="2">
<Episode>
<Section type="report" startTime="0" endTime="12">
<Turn startTime="0" endTime="12">
<Sync time="0"/>
[Alice; 2020-05-01; 09:00; ex1; NE]
<Sync time="3.215"/>
i1: honeybee
<Sync time="5.8"/><Event desc="wind" type="noise" extent="instantaneous"/>
<Sync time="12"/>
i1 exit
</Turn>
</Section>
</Episode>
</Trans>
"#;

    #[test]
    fn test_one_entry_per_sync_in_document_order() {
        let entries = parse_transcript(SAMPLE, &config()).unwrap();

        let timestamps: Vec<&str> = entries.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(timestamps, vec!["0", "3.215", "5.8", "12"]);
        let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_entry_text_is_the_following_text_node() {
        let entries = parse_transcript(SAMPLE, &config()).unwrap();

        assert_eq!(entries[0].text, "\n[Alice; 2020-05-01; 09:00; ex1; NE]\n");
        assert_eq!(entries[1].text, "\ni1: honeybee\n");
        assert_eq!(entries[3].text, "\ni1 exit\n");
    }

    #[test]
    fn test_element_directly_after_sync_gives_empty_text() {
        let entries = parse_transcript(SAMPLE, &config()).unwrap();
        assert_eq!(entries[2].text, "");
    }

    #[test]
    fn test_entities_are_decoded() {
        let source = r#"<Turn><Sync time="1"/>i1 scan p3 (left &amp; right)
</Turn>"#;
        let entries = parse_transcript(source, &config()).unwrap();
        assert_eq!(entries[0].text, "i1 scan p3 (left & right)\n");
    }

    #[test]
    fn test_missing_time_attribute_is_an_error() {
        let source = "<Turn><Sync/>i1 exit\n</Turn>";
        let err = parse_transcript(source, &config()).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedTranscript(_)));
    }

    #[test]
    fn test_declared_latin1_is_decoded() {
        let bytes: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
            <Turn><Sync time=\"0\"/>[Ren\xE9e; 2020-05-01; 09:00; ex1; NE]\n</Turn>";

        let source = decode_transcript(bytes).unwrap();
        let entries = parse_transcript(&source, &config()).unwrap();
        assert_eq!(entries[0].text, "[Ren\u{e9}e; 2020-05-01; 09:00; ex1; NE]\n");
    }

    #[test]
    fn test_undeclared_encoding_defaults_to_utf8() {
        let text = "<Turn><Sync time=\"0\"/>i1: abeille (ouvri\u{e8}re)</Turn>";
        let source = decode_transcript(text.as_bytes()).unwrap();
        assert!(source.contains("ouvri\u{e8}re"));
    }

    #[test]
    fn test_bom_overrides_declaration() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><Sync time=\"0\"/>caf\u{e9}".as_bytes(),
        );

        let source = decode_transcript(&bytes).unwrap();
        assert!(source.ends_with("caf\u{e9}"));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let bytes = b"<Turn><Sync time=\"0\"/>[Ren\xE9e; 2020-05-01; 09:00; ex1; NE]</Turn>";
        let err = decode_transcript(bytes).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedTranscript(_)));
    }

    #[test]
    fn test_unknown_declared_encoding_is_an_error() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"klingon-8\"?><Sync time=\"0\"/>";
        let err = decode_transcript(bytes).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedTranscript(_)));
    }

    #[test]
    fn test_no_sync_tags_gives_no_entries() {
        let entries = parse_transcript("<Trans><Episode></Episode></Trans>", &config()).unwrap();
        assert!(entries.is_empty());
    }
}
