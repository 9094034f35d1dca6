//! Literal phrase masking applied to notes before sentence splitting.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    data::records::NoteRow,
    errors::{PipelineError, PipelineResult},
};

/// Characters removed after masking so the text stays JSON and CSV friendly.
/// Square brackets survive so mask tokens such as `[REDACTED]` stay intact.
static PUNCT_TO_REMOVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["()*\\^`{}]"#).expect("valid regex"));

const DEFAULT_MASK: &[(&str, &str)] = &[
    ("Mrs.", "[TITLE]"),
    ("Mr.", "[TITLE]"),
    ("Ms.", "[TITLE]"),
    ("Miss ", "[TITLE] "),
    ("Dr.", "[TITLE]"),
];

/// Ordered phrase to token substitution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonMask(IndexMap<String, String>);

impl Default for AnonMask {
    fn default() -> Self {
        Self(
            DEFAULT_MASK
                .iter()
                .map(|(phrase, token)| ((*phrase).to_string(), (*token).to_string()))
                .collect(),
        )
    }
}

impl AnonMask {
    pub fn new(entries: IndexMap<String, String>) -> Self {
        Self(entries)
    }

    /// Parse a JSON object of phrase to token strings.
    pub fn from_json(bytes: &[u8]) -> PipelineResult<Self> {
        serde_json::from_slice(bytes).map_err(|err| PipelineError::InvalidMask(err.to_string()))
    }

    /// Load the configured mask file, or fall back to the built-in titles.
    pub fn load_or_default(path: Option<&Path>) -> PipelineResult<Self> {
        match path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|err| {
                    PipelineError::InvalidMask(format!("{}: {err}", path.display()))
                })?;
                let mask = Self::from_json(&bytes)?;
                info!(path = %path.display(), phrases = mask.len(), "loaded anon mask");
                Ok(mask)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every phrase in mask order, then flatten newlines and strip punctuation.
    pub fn apply(&self, text: &str) -> String {
        let mut sample = text.to_string();
        for (phrase, token) in &self.0 {
            if !phrase.is_empty() && sample.contains(phrase.as_str()) {
                sample = sample.replace(phrase.as_str(), token);
            }
        }
        let sample = sample.replace('\n', " ");
        PUNCT_TO_REMOVE.replace_all(&sample, "").into_owned()
    }
}

/// A note whose text has been masked.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedNote {
    pub person_id: String,
    pub date: String,
    pub document_id: String,
    pub text: String,
}

pub fn mask_notes(notes: &[NoteRow], mask: &AnonMask) -> Vec<MaskedNote> {
    notes
        .iter()
        .map(|note| MaskedNote {
            person_id: note.person_id.clone(),
            date: note.date.clone(),
            document_id: note.document_id.clone(),
            text: mask.apply(&note.response),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_braces() {
        let mask = AnonMask::new(IndexMap::new());
        assert_eq!(mask.apply("say \"hi\" (now)\n{x} [y]"), "say hi now x [y]");
    }
}
