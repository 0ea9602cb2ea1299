//! Observation context
//!
//! The running state carried from one transcript entry to the next: the current observation
//! metadata (replaced by each metadata block, corner patched by `!` lines) and the registry of
//! declared insects. Owned exclusively by one classification pass.

use crate::trs::error::{ConvertError, Result};
use crate::trs::extraction::InsectIndex;
use std::collections::HashMap;

/// Who observed which exclosure, when, and from which corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationMetadata {
    pub observer: String,
    pub date: String,
    pub time: String,
    pub exclosure: String,
    pub corner: String,
}

/// Insect index tokens (`i3`) mapped to their declared type labels.
///
/// Entries are never removed; re-declaring an index overwrites its label. The most recent
/// declaration is remembered so event lines without an explicit index can refer to it.
#[derive(Debug, Clone, Default)]
pub struct InsectRegistry {
    insects: HashMap<String, String>,
    last_declared: Option<InsectIndex>,
}

impl InsectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the label previously held by the index, if any.
    pub fn declare(&mut self, index: InsectIndex, label: String) -> Option<String> {
        let previous = self.insects.insert(index.token.clone(), label);
        self.last_declared = Some(index);
        previous
    }

    pub fn label(&self, token: &str) -> Option<&str> {
        self.insects.get(token).map(String::as_str)
    }

    /// Label lookup that fails with [`ConvertError::UndeclaredInsect`].
    pub fn resolve(&self, index: &InsectIndex) -> Result<&str> {
        self.label(&index.token)
            .ok_or_else(|| ConvertError::UndeclaredInsect(index.token.clone()))
    }

    pub fn last_declared(&self) -> Option<&InsectIndex> {
        self.last_declared.as_ref()
    }

    pub fn len(&self) -> usize {
        self.insects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insects.is_empty()
    }
}

/// Metadata and insect registry threaded through the classifier.
#[derive(Debug, Clone, Default)]
pub struct ObservationContext {
    metadata: Option<ObservationMetadata>,
    pub insects: InsectRegistry,
}

impl ObservationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> Option<&ObservationMetadata> {
        self.metadata.as_ref()
    }

    /// Metadata lookup that fails with [`ConvertError::MissingMetadata`].
    pub fn require_metadata(&self, timestamp: &str) -> Result<&ObservationMetadata> {
        self.metadata
            .as_ref()
            .ok_or_else(|| ConvertError::MissingMetadata {
                timestamp: timestamp.to_string(),
            })
    }

    pub fn replace_metadata(&mut self, metadata: ObservationMetadata) {
        self.metadata = Some(metadata);
    }

    /// Change the corner of the current observation. Fails when there is no observation yet.
    pub fn update_corner(&mut self, corner: &str, timestamp: &str) -> Result<()> {
        let metadata = self
            .metadata
            .as_mut()
            .ok_or_else(|| ConvertError::MissingMetadata {
                timestamp: timestamp.to_string(),
            })?;
        metadata.corner = corner.to_string();
        Ok(())
    }
}
