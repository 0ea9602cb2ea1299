//! Layout Table Loader
//!
//! Parses the whitespace-delimited plant layout file into one position map per exclosure.
//!
//! Each non-blank line has at least six columns:
//!
//!     <plant> <reserved> <exclosure-marker> <position> <male-flowers> <female-flowers>
//!
//! The exclosure marker is `1`, `2` or `3`, or the skip marker (`x` by default) for positions that
//! hold no plant. Any other marker makes the whole file invalid. Plant labels and flower counts
//! are kept verbatim since they are copied straight into the output table.

use crate::trs::error::{ConvertError, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const MIN_COLUMNS: usize = 6;

/// One of the three fenced observation plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclosureId {
    One,
    Two,
    Three,
}

impl ExclosureId {
    pub const ALL: [ExclosureId; 3] = [ExclosureId::One, ExclosureId::Two, ExclosureId::Three];

    /// Resolve the marker used in the layout file (`1`, `2`, `3`).
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "1" => Some(ExclosureId::One),
            "2" => Some(ExclosureId::Two),
            "3" => Some(ExclosureId::Three),
            _ => None,
        }
    }

    /// Resolve the label used in transcript metadata (`ex1`, `ex2`, `ex3`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ex1" => Some(ExclosureId::One),
            "ex2" => Some(ExclosureId::Two),
            "ex3" => Some(ExclosureId::Three),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        match self {
            ExclosureId::One => 0,
            ExclosureId::Two => 1,
            ExclosureId::Three => 2,
        }
    }
}

impl fmt::Display for ExclosureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ex{}", self.slot() + 1)
    }
}

/// The plant occupying a position, with its flower counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantPosition {
    pub plant: String,
    pub male_flowers: String,
    pub female_flowers: String,
}

/// Position id to plant mapping for a single exclosure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclosureLayout {
    positions: HashMap<String, PlantPosition>,
}

impl ExclosureLayout {
    pub fn get(&self, position: &str) -> Option<&PlantPosition> {
        self.positions.get(position)
    }

    pub fn contains(&self, position: &str) -> bool {
        self.positions.contains_key(position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the previous plant if the position was already taken.
    fn insert(&mut self, position: String, plant: PlantPosition) -> Option<PlantPosition> {
        self.positions.insert(position, plant)
    }
}

/// The full layout: one [`ExclosureLayout`] per exclosure. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    exclosures: [ExclosureLayout; 3],
}

impl Layout {
    /// Load and parse a layout file.
    pub fn load(path: impl AsRef<Path>, skip_marker: &str) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let layout = Self::parse(&source, skip_marker)?;
        info!(
            path = %path.display(),
            ex1 = layout.exclosure(ExclosureId::One).len(),
            ex2 = layout.exclosure(ExclosureId::Two).len(),
            ex3 = layout.exclosure(ExclosureId::Three).len(),
            "loaded layout"
        );
        Ok(layout)
    }

    /// Parse layout text. Fails on the first row with an unrecognized exclosure marker.
    pub fn parse(source: &str, skip_marker: &str) -> Result<Self> {
        let mut layout = Layout::default();

        for (idx, line) in source.lines().enumerate() {
            let line_number = idx + 1;
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.is_empty() {
                continue;
            }
            if columns.len() < MIN_COLUMNS {
                return Err(ConvertError::Format {
                    line: line_number,
                    message: format!(
                        "expected at least {} columns, found {}",
                        MIN_COLUMNS,
                        columns.len()
                    ),
                });
            }

            let marker = columns[2];
            if marker == skip_marker {
                continue;
            }
            let exclosure = ExclosureId::from_marker(marker).ok_or_else(|| ConvertError::Format {
                line: line_number,
                message: format!("unrecognized exclosure marker '{}'", marker),
            })?;

            let position = columns[3].to_string();
            let plant = PlantPosition {
                plant: columns[0].to_string(),
                male_flowers: columns[4].to_string(),
                female_flowers: columns[5].to_string(),
            };
            if let Some(previous) = layout.exclosures[exclosure.slot()].insert(position, plant) {
                warn!(
                    line = line_number,
                    exclosure = %exclosure,
                    position = columns[3],
                    replaced = %previous.plant,
                    "duplicate layout position, keeping the later row"
                );
            }
        }

        Ok(layout)
    }

    pub fn exclosure(&self, id: ExclosureId) -> &ExclosureLayout {
        &self.exclosures[id.slot()]
    }

    /// Resolve a position within the exclosure named by a metadata label such as `ex2`.
    pub fn resolve(&self, exclosure_label: &str, position: &str) -> Result<&PlantPosition> {
        let id = ExclosureId::from_label(exclosure_label)
            .ok_or_else(|| ConvertError::UnknownExclosure(exclosure_label.to_string()))?;
        self.exclosure(id)
            .get(position)
            .ok_or_else(|| ConvertError::UnknownPosition {
                exclosure: id.to_string(),
                position: position.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Salvia      a  1  3  2  5
Penstemon   a  1  7  4  0
Cucurbita   b  2  3  6  1
Empty       -  x  9  0  0
Lupinus     c  3  3  1  1
";

    #[test]
    fn test_parses_one_map_per_exclosure() {
        let layout = Layout::parse(SAMPLE, "x").unwrap();

        assert_eq!(layout.exclosure(ExclosureId::One).len(), 2);
        assert_eq!(layout.exclosure(ExclosureId::Two).len(), 1);
        assert_eq!(layout.exclosure(ExclosureId::Three).len(), 1);
        assert_eq!(
            layout.exclosure(ExclosureId::One).get("3"),
            Some(&PlantPosition {
                plant: "Salvia".to_string(),
                male_flowers: "2".to_string(),
                female_flowers: "5".to_string(),
            })
        );
        assert_eq!(
            layout.exclosure(ExclosureId::Two).get("3").unwrap().plant,
            "Cucurbita"
        );
    }

    #[test]
    fn test_skip_marker_rows_are_not_mapped() {
        let layout = Layout::parse(SAMPLE, "x").unwrap();

        for id in ExclosureId::ALL {
            assert!(!layout.exclosure(id).contains("9"));
        }
    }

    #[test]
    fn test_unrecognized_marker_is_format_error() {
        let source = "Salvia a 1 3 2 5\nOdd a 9 4 1 1\n";
        let err = Layout::parse(source, "x").unwrap_err();

        match err {
            ConvertError::Format { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("'9'"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_is_format_error() {
        let err = Layout::parse("Salvia a 1 3\n", "x").unwrap_err();
        assert!(matches!(err, ConvertError::Format { line: 1, .. }));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let layout = Layout::parse("\nSalvia a 1 3 2 5\n   \n", "x").unwrap();
        assert_eq!(layout.exclosure(ExclosureId::One).len(), 1);
    }

    #[test]
    fn test_duplicate_position_last_row_wins() {
        let layout = Layout::parse("Salvia a 1 3 2 5\nMimulus a 1 3 8 8\n", "x").unwrap();
        let plant = layout.exclosure(ExclosureId::One).get("3").unwrap();
        assert_eq!(plant.plant, "Mimulus");
        assert_eq!(plant.male_flowers, "8");
    }

    #[test]
    fn test_custom_skip_marker() {
        let layout = Layout::parse("Empty - - 4 0 0\n", "-").unwrap();
        assert!(layout.exclosure(ExclosureId::One).is_empty());
        assert!(Layout::parse("Empty - - 4 0 0\n", "x").is_err());
    }

    #[test]
    fn test_resolve_by_metadata_label() {
        let layout = Layout::parse(SAMPLE, "x").unwrap();

        assert_eq!(layout.resolve("ex3", "3").unwrap().plant, "Lupinus");
        assert!(matches!(
            layout.resolve("ex4", "3"),
            Err(ConvertError::UnknownExclosure(label)) if label == "ex4"
        ));
        assert!(matches!(
            layout.resolve("ex2", "7"),
            Err(ConvertError::UnknownPosition { exclosure, position })
                if exclosure == "ex2" && position == "7"
        ));
    }

    #[test]
    fn test_exclosure_id_round_trips_through_display() {
        for id in ExclosureId::ALL {
            assert_eq!(ExclosureId::from_label(&id.to_string()), Some(id));
        }
    }
}
