//! Conversion API
//!
//! [`Converter`] is the entry point for a full run: layout file + transcript file in, behavior
//! table out. String-based methods do the work; the file-based method is a thin wrapper that
//! handles paths and I/O errors.
//!
//! Ordering guarantees:
//!
//! - The layout is loaded and validated before the output file is created. A broken layout
//!   leaves no output behind.
//! - Rows are written as entries are classified. A failure part way through leaves the header and
//!   every row written so far in the output file.

use crate::trs::classifier::TranscriptClassifier;
use crate::trs::config::ConvertConfig;
use crate::trs::error::{ConvertError, Result};
use crate::trs::layout::Layout;
use crate::trs::output::DelimitedWriter;
use crate::trs::transcript::{self, TranscriptEntry};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Counts reported after a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionSummary {
    /// Transcript entries read
    pub entries: usize,
    /// Rows written, excluding the header
    pub rows: usize,
}

pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Load the layout file with the configured skip marker.
    pub fn load_layout(&self, path: impl AsRef<Path>) -> Result<Layout> {
        Layout::load(path, &self.config.layout.skip_marker)
    }

    /// Parse layout text with the configured skip marker.
    pub fn parse_layout(&self, source: &str) -> Result<Layout> {
        Layout::parse(source, &self.config.layout.skip_marker)
    }

    /// Parse transcript markup into entries.
    pub fn parse_transcript(&self, source: &str) -> Result<Vec<TranscriptEntry>> {
        transcript::parse_transcript(source, &self.config.transcript)
    }

    /// Convert files on disk: `input` transcript, `layout` table, `output` table.
    pub fn convert_files(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        layout: impl AsRef<Path>,
    ) -> Result<ConversionSummary> {
        let output = output.as_ref();

        let layout = self.load_layout(layout)?;
        let entries = transcript::read_transcript(input, &self.config.transcript)?;

        let file = File::create(output).map_err(|e| ConvertError::io(output, e))?;
        let summary = self
            .write_entries(&entries, &layout, BufWriter::new(file))
            .map_err(|e| match e {
                ConvertError::Output(source) => ConvertError::io(output, source),
                other => other,
            })?;

        info!(
            output = %output.display(),
            entries = summary.entries,
            rows = summary.rows,
            "conversion complete"
        );
        Ok(summary)
    }

    /// Convert in-memory transcript and layout text, returning the table as a string.
    pub fn convert_str(&self, transcript: &str, layout: &str) -> Result<String> {
        let layout = self.parse_layout(layout)?;
        let entries = self.parse_transcript(transcript)?;

        let mut buffer = Vec::new();
        self.write_entries(&entries, &layout, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the header, then one row per event entry, in entry order.
    pub fn write_entries<W: Write>(
        &self,
        entries: &[TranscriptEntry],
        layout: &Layout,
        sink: W,
    ) -> Result<ConversionSummary> {
        let mut writer = DelimitedWriter::new(sink, &self.config.output);
        writer.write_header()?;

        let mut classifier = TranscriptClassifier::new(layout, &self.config);
        let mut summary = ConversionSummary {
            entries: entries.len(),
            rows: 0,
        };
        for entry in entries {
            let row = match classifier.process(entry) {
                Ok(row) => row,
                Err(e) => {
                    if let Err(flush_error) = writer.flush() {
                        warn!(error = %flush_error, "could not flush rows before the failure");
                    }
                    return Err(e);
                }
            };
            if let Some(row) = row {
                writer.write_row(&row)?;
                summary.rows += 1;
            }
        }

        writer.flush()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trs::config::Loader;

    fn converter() -> Converter {
        let config = Loader::new()
            .set_override("output.line_terminator", "\n")
            .unwrap()
            .build()
            .unwrap();
        Converter::new(config)
    }

    const LAYOUT: &str = "Salvia a 1 3 2 5\n";

    const TRANSCRIPT: &str = r#"<Trans><Episode><Section><Turn>
<Sync time="0"/>
[Alice; 2020-05-01; 09:00; ex1; NE]
<Sync time="1.5"/>
i1: honeybee
<Sync time="2.25"/>
scan p3
</Turn></Section></Episode></Trans>"#;

    #[test]
    fn test_convert_str_writes_header_and_rows() {
        let table = converter().convert_str(TRANSCRIPT, LAYOUT).unwrap();

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("observer\tdate\t"));
        assert_eq!(
            lines[1],
            "Alice\t2020-05-01\t09:00\tex1\tNE\thoneybee\t1\t2.25\tscan\tSalvia\t3\t2\t5\t"
        );
    }

    #[test]
    fn test_layout_error_comes_before_transcript() {
        let err = converter()
            .convert_str("<Sync/>", "Salvia a 9 3 2 5\n")
            .unwrap_err();
        assert!(matches!(err, ConvertError::Format { .. }));
    }

    #[test]
    fn test_partial_output_is_flushed_on_error() {
        let converter = converter();
        let layout = converter.parse_layout(LAYOUT).unwrap();
        let transcript = TRANSCRIPT.replace("scan p3", "i1 exit\n<Sync time=\"3\"/>\ni9 exit");
        let entries = converter.parse_transcript(&transcript).unwrap();

        let mut buffer = Vec::new();
        let err = converter
            .write_entries(&entries, &layout, &mut buffer)
            .unwrap_err();

        assert!(matches!(err, ConvertError::UndeclaredInsect(_)));
        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    /// Accepts every write but refuses to flush.
    struct UnflushableSink;

    impl Write for UnflushableSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk detached"))
        }
    }

    #[test]
    fn test_flush_failure_does_not_mask_classification_error() {
        let converter = converter();
        let layout = converter.parse_layout(LAYOUT).unwrap();
        let transcript = TRANSCRIPT.replace("scan p3", "i9 exit");
        let entries = converter.parse_transcript(&transcript).unwrap();

        let err = converter
            .write_entries(&entries, &layout, UnflushableSink)
            .unwrap_err();

        assert!(matches!(err, ConvertError::UndeclaredInsect(_)));
    }

    #[test]
    fn test_summary_counts() {
        let converter = converter();
        let layout = converter.parse_layout(LAYOUT).unwrap();
        let entries = converter.parse_transcript(TRANSCRIPT).unwrap();

        let summary = converter
            .write_entries(&entries, &layout, std::io::sink())
            .unwrap();
        assert_eq!(summary, ConversionSummary { entries: 3, rows: 1 });
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let converter = converter();
        let first = converter.convert_str(TRANSCRIPT, LAYOUT).unwrap();
        let second = converter.convert_str(TRANSCRIPT, LAYOUT).unwrap();
        assert_eq!(first, second);
    }
}
