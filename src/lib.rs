//! # trs-convert
//!
//! Converts annotated Transcriber (`.trs`) field-observation transcripts into a
//! long-form, delimited table of pollinator behavior events.
//!
//! See the [trs module](trs) for the processing stages.

pub mod trs;
