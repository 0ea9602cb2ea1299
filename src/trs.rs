//! Transcript conversion
//!
//! This module orchestrates the conversion of a Transcriber observation transcript into a
//! long-form behavior table.
//!
//! Structure:
//!     A conversion is a single pass over the transcript. Nothing is buffered beyond the output
//! writer: each entry is classified, the running observation context is updated, and at most one
//! row is written before the next entry is read.
//!
//! The pipeline consists of:
//! 1. Layout loading (./layout.rs): the plant layout table becomes one position map per exclosure.
//!    This happens before anything else so a broken layout never produces output.
//! 2. Transcript reading (./transcript.rs): the `.trs` markup is parsed into an ordered list of
//!    timestamped text entries, one per `Sync` tag.
//! 3. Line classification (./line_classification.rs): each entry text is assigned exactly one
//!    line type using a fixed rule precedence.
//! 4. Classification state machine (./classifier.rs): line types update the observation context
//!    (./context.rs) or produce an [`OutputRow`], pulling tokens out with ./extraction.rs.
//! 5. Output (./output.rs): rows go to a delimited writer in entry order.
//!
//! Failure Model
//!
//!     Conversion is fail-fast. Every error in [`ConvertError`] aborts the run; there is no
//!     skip-and-continue. Rows written before the failure stay in the output file.

pub mod classifier;
pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod line_classification;
pub mod output;
pub mod transcript;

pub use classifier::TranscriptClassifier;
pub use self::config::{ConvertConfig, Loader};
pub use context::{InsectRegistry, ObservationContext, ObservationMetadata};
pub use converter::{ConversionSummary, Converter};
pub use error::{ConvertError, Result};
pub use layout::{ExclosureId, ExclosureLayout, Layout, PlantPosition};
pub use line_classification::{classify_line, LineType};
pub use output::{Behavior, DelimitedWriter, OutputRow, HEADER};
pub use transcript::TranscriptEntry;
