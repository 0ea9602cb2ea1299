//! Output table
//!
//! The emitted record ([`OutputRow`]) and the delimited writer that serializes rows.
//!
//! Quoting is minimal: a field is wrapped in the quote character only when it contains the
//! delimiter, the quote character, or a line break. Embedded quote characters are doubled.

use crate::trs::config::OutputConfig;
use std::fmt;
use std::io::{self, Write};

/// Column names, in output order
pub const HEADER: [&str; 14] = [
    "observer",
    "date",
    "time",
    "exclosure",
    "corner",
    "insectType",
    "insectGroup",
    "timeStamp",
    "behavior",
    "plant",
    "position",
    "maleFlowers",
    "femaleFlowers",
    "notes",
];

/// Behavior label written to the `behavior` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Search,
    Exit,
    Scan,
    Land,
}

impl Behavior {
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Search => "search",
            Behavior::Exit => "exit",
            Behavior::Scan => "scan",
            Behavior::Land => "land",
        }
    }

    /// Scan and land events carry a plant position; search and exit do not
    pub fn is_positional(&self) -> bool {
        matches!(self, Behavior::Scan | Behavior::Land)
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recognized behavior event.
///
/// Positional fields hold the configured missing value (`NA`) for non-positional behaviors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub observer: String,
    pub date: String,
    pub time: String,
    pub exclosure: String,
    pub corner: String,
    pub insect_type: String,
    pub insect_group: String,
    pub timestamp: String,
    pub behavior: Behavior,
    pub plant: String,
    pub position: String,
    pub male_flowers: String,
    pub female_flowers: String,
    pub notes: String,
}

impl OutputRow {
    /// Field values in [`HEADER`] order
    pub fn fields(&self) -> [&str; 14] {
        [
            &self.observer,
            &self.date,
            &self.time,
            &self.exclosure,
            &self.corner,
            &self.insect_type,
            &self.insect_group,
            &self.timestamp,
            self.behavior.label(),
            &self.plant,
            &self.position,
            &self.male_flowers,
            &self.female_flowers,
            &self.notes,
        ]
    }
}

/// Writes delimited records to any [`Write`] sink.
pub struct DelimitedWriter<W: Write> {
    inner: W,
    delimiter: char,
    quote_char: char,
    line_terminator: String,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W, config: &OutputConfig) -> Self {
        Self {
            inner,
            delimiter: config.delimiter,
            quote_char: config.quote_char,
            line_terminator: config.line_terminator.clone(),
        }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_record(&HEADER)
    }

    pub fn write_row(&mut self, row: &OutputRow) -> io::Result<()> {
        self.write_record(&row.fields())
    }

    pub fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        let mut line = String::new();
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                line.push(self.delimiter);
            }
            self.push_field(&mut line, field.as_ref());
        }
        line.push_str(&self.line_terminator);
        self.inner.write_all(line.as_bytes())
    }

    fn push_field(&self, line: &mut String, field: &str) {
        let needs_quotes = field
            .chars()
            .any(|c| c == self.delimiter || c == self.quote_char || c == '\r' || c == '\n');
        if !needs_quotes {
            line.push_str(field);
            return;
        }

        line.push(self.quote_char);
        for c in field.chars() {
            if c == self.quote_char {
                line.push(c);
            }
            line.push(c);
        }
        line.push(self.quote_char);
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trs::config::load_defaults;

    fn writer() -> DelimitedWriter<Vec<u8>> {
        let mut config = load_defaults().unwrap().output;
        config.line_terminator = "\n".to_string();
        DelimitedWriter::new(Vec::new(), &config)
    }

    fn written(writer: DelimitedWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_header_has_fourteen_tab_separated_columns() {
        let mut w = writer();
        w.write_header().unwrap();

        let out = written(w);
        assert_eq!(
            out,
            "observer\tdate\ttime\texclosure\tcorner\tinsectType\tinsectGroup\ttimeStamp\tbehavior\tplant\tposition\tmaleFlowers\tfemaleFlowers\tnotes\n"
        );
    }

    #[test]
    fn test_plain_fields_are_unquoted() {
        let mut w = writer();
        w.write_record(&["Bombus impatiens", "", "NA"]).unwrap();
        assert_eq!(written(w), "Bombus impatiens\t\tNA\n");
    }

    #[test]
    fn test_fields_with_special_characters_are_quoted() {
        let mut w = writer();
        w.write_record(&["a\tb", "x|y", "two\nlines"]).unwrap();
        assert_eq!(written(w), "|a\tb|\t|x||y|\t|two\nlines|\n");
    }

    #[test]
    fn test_default_line_terminator_is_crlf() {
        let config = load_defaults().unwrap().output;
        let mut w = DelimitedWriter::new(Vec::new(), &config);
        w.write_record(&["a", "b"]).unwrap();
        assert_eq!(written(w), "a\tb\r\n");
    }

    #[test]
    fn test_row_fields_follow_header_order() {
        let row = OutputRow {
            observer: "Alice".to_string(),
            date: "2020-05-01".to_string(),
            time: "09:00".to_string(),
            exclosure: "ex1".to_string(),
            corner: "NE".to_string(),
            insect_type: "honeybee".to_string(),
            insect_group: "1".to_string(),
            timestamp: "9.02".to_string(),
            behavior: Behavior::Land,
            plant: "Salvia".to_string(),
            position: "3".to_string(),
            male_flowers: "2".to_string(),
            female_flowers: "5".to_string(),
            notes: String::new(),
        };

        let fields = row.fields();
        assert_eq!(fields[HEADER.iter().position(|c| *c == "behavior").unwrap()], "land");
        assert_eq!(fields[HEADER.iter().position(|c| *c == "plant").unwrap()], "Salvia");
        assert_eq!(fields[13], "");
    }

    #[test]
    fn test_behavior_positional() {
        assert!(Behavior::Scan.is_positional());
        assert!(Behavior::Land.is_positional());
        assert!(!Behavior::Search.is_positional());
        assert!(!Behavior::Exit.is_positional());
    }
}
