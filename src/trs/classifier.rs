//! Classification state machine
//!
//! Walks transcript entries in document order. Each entry is classified
//! ([`classify_line`]) and then either updates the [`ObservationContext`] or yields exactly one
//! [`OutputRow`]:
//!
//! | Line type           | Effect                                         |
//! |---------------------|------------------------------------------------|
//! | end marker          | none                                           |
//! | metadata            | replaces the current metadata                  |
//! | corner update       | replaces the current corner                    |
//! | insect declaration  | registers or re-registers an insect            |
//! | search              | `search` row                                   |
//! | exit, lost          | `exit` row                                     |
//! | scan, land          | `scan`/`land` row resolved against the layout  |
//! | unrecognized        | none                                           |
//!
//! Event lines name their insect with an `i<digits>` token. A line without one refers to the
//! most recently declared insect.

use crate::trs::config::ConvertConfig;
use crate::trs::context::ObservationContext;
use crate::trs::error::{ConvertError, Result};
use crate::trs::extraction::{self, InsectIndex};
use crate::trs::layout::Layout;
use crate::trs::line_classification::{classify_line, LineType};
use crate::trs::output::{Behavior, OutputRow};
use crate::trs::transcript::TranscriptEntry;
use tracing::{debug, warn};

/// Positional columns of a row: plant, position, male flowers, female flowers
type PositionColumns = (String, String, String, String);

pub struct TranscriptClassifier<'a> {
    layout: &'a Layout,
    end_markers: Vec<String>,
    missing_value: String,
    context: ObservationContext,
}

impl<'a> TranscriptClassifier<'a> {
    pub fn new(layout: &'a Layout, config: &ConvertConfig) -> Self {
        Self {
            layout,
            end_markers: config.transcript.end_markers.clone(),
            missing_value: config.output.missing_value.clone(),
            context: ObservationContext::new(),
        }
    }

    pub fn context(&self) -> &ObservationContext {
        &self.context
    }

    /// Classify every entry, stopping at the first error.
    pub fn classify_all<'e, I>(&mut self, entries: I) -> Result<Vec<OutputRow>>
    where
        I: IntoIterator<Item = &'e TranscriptEntry>,
    {
        let mut rows = Vec::new();
        for entry in entries {
            if let Some(row) = self.process(entry)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Apply one entry to the running context, returning the row it produces, if any.
    pub fn process(&mut self, entry: &TranscriptEntry) -> Result<Option<OutputRow>> {
        let line_type = classify_line(&entry.text, &self.end_markers);
        debug!(
            index = entry.index,
            timestamp = %entry.timestamp,
            ?line_type,
            "classified entry"
        );

        match line_type {
            LineType::EndMarker | LineType::Unrecognized => Ok(None),
            LineType::Metadata => {
                self.apply_metadata(entry)?;
                Ok(None)
            }
            LineType::CornerUpdate => {
                let corner = extraction::corner_update(&entry.text).ok_or_else(|| {
                    ConvertError::malformed(&entry.timestamp, "no corner after '!'")
                })?;
                self.context.update_corner(corner, &entry.timestamp)?;
                Ok(None)
            }
            LineType::InsectDeclaration => {
                self.apply_declaration(entry)?;
                Ok(None)
            }
            LineType::Search => self.event_row(entry, Behavior::Search).map(Some),
            LineType::Exit | LineType::Lost => self.event_row(entry, Behavior::Exit).map(Some),
            LineType::Scan => self.event_row(entry, Behavior::Scan).map(Some),
            LineType::Land => self.event_row(entry, Behavior::Land).map(Some),
        }
    }

    fn apply_metadata(&mut self, entry: &TranscriptEntry) -> Result<()> {
        let content = extraction::bracket_content(&entry.text)
            .ok_or_else(|| ConvertError::malformed(&entry.timestamp, "no metadata block"))?;
        let parsed = extraction::parse_metadata(content).ok_or_else(|| {
            ConvertError::malformed(
                &entry.timestamp,
                format!(
                    "metadata block needs {} ';'-separated fields (observer; date; time; exclosure; corner)",
                    extraction::METADATA_FIELDS
                ),
            )
        })?;

        if parsed.ignored_fields > 0 {
            warn!(
                timestamp = %entry.timestamp,
                ignored = parsed.ignored_fields,
                "metadata block has extra fields"
            );
        }
        self.context.replace_metadata(parsed.metadata);
        Ok(())
    }

    fn apply_declaration(&mut self, entry: &TranscriptEntry) -> Result<()> {
        let declaration = extraction::insect_declaration(&entry.text)
            .ok_or_else(|| ConvertError::malformed(&entry.timestamp, "no insect index"))?;

        let token = declaration.index.token.clone();
        if let Some(previous) = self
            .context
            .insects
            .declare(declaration.index, declaration.label)
        {
            debug!(insect = %token, replaced = %previous, "insect re-declared");
        }
        if !declaration.comment.is_empty() {
            debug!(insect = %token, comment = %declaration.comment, "declaration comment");
        }
        Ok(())
    }

    fn event_row(&self, entry: &TranscriptEntry, behavior: Behavior) -> Result<OutputRow> {
        let metadata = self.context.require_metadata(&entry.timestamp)?;
        let index = self.insect_for(entry)?;
        let insect_type = self.context.insects.resolve(&index)?.to_string();

        let (plant, position, male_flowers, female_flowers) = if behavior.is_positional() {
            self.position_columns(entry, behavior, &metadata.exclosure)?
        } else {
            (
                self.missing_value.clone(),
                self.missing_value.clone(),
                self.missing_value.clone(),
                self.missing_value.clone(),
            )
        };

        Ok(OutputRow {
            observer: metadata.observer.clone(),
            date: metadata.date.clone(),
            time: metadata.time.clone(),
            exclosure: metadata.exclosure.clone(),
            corner: metadata.corner.clone(),
            insect_type,
            insect_group: index.group,
            timestamp: entry.timestamp.clone(),
            behavior,
            plant,
            position,
            male_flowers,
            female_flowers,
            notes: extraction::comment(&entry.text),
        })
    }

    fn insect_for(&self, entry: &TranscriptEntry) -> Result<InsectIndex> {
        extraction::insect_index(&entry.text)
            .or_else(|| self.context.insects.last_declared().cloned())
            .ok_or_else(|| {
                ConvertError::malformed(
                    &entry.timestamp,
                    "no insect index and no insect declared yet",
                )
            })
    }

    fn position_columns(
        &self,
        entry: &TranscriptEntry,
        behavior: Behavior,
        exclosure: &str,
    ) -> Result<PositionColumns> {
        let position = extraction::position(&entry.text).ok_or_else(|| {
            ConvertError::malformed(
                &entry.timestamp,
                format!("{} entry has no position token", behavior),
            )
        })?;
        let plant = self.layout.resolve(exclosure, position)?;

        Ok((
            plant.plant.clone(),
            position.to_string(),
            plant.male_flowers.clone(),
            plant.female_flowers.clone(),
        ))
    }
}
