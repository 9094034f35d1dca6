//! Sentence boundary detection for masked notes.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{data::records::SentenceRecord, nlp::mask::MaskedNote};

/// Splits free text into sentences.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Terminal punctuation, optional closing quotes or brackets, then whitespace.
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+['"’”)\]]*\s+"#).expect("valid regex"));

static ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "approx",
    "dept", "inc", "ltd", "mg", "ml",
];

/// Capitalised words that open a sentence rather than continue a name.
static SENTENCE_STARTERS: &[&str] = &[
    "A", "An", "The", "I", "It", "He", "She", "We", "They", "You", "This", "That", "These",
    "Those", "There", "His", "Her", "Their", "Our", "My", "No", "Not",
];

/// Punctuation-driven splitter that leaves common abbreviations intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleSplitter;

impl SentenceSplitter for RuleSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in BOUNDARY.find_iter(text) {
            if continues_sentence(&text[start..boundary.start()], &text[boundary.end()..]) {
                continue;
            }
            push_trimmed(&mut sentences, &text[start..boundary.end()]);
            start = boundary.end();
        }
        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }
}

fn push_trimmed(out: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Whether the period closing `head` belongs to an abbreviation, given the
/// text that follows it.
fn continues_sentence(head: &str, tail: &str) -> bool {
    let Some(last) = head.split_whitespace().last() else {
        return false;
    };
    let word = last.trim_start_matches(|c: char| !c.is_alphanumeric());
    let lower = word.to_lowercase();
    let next = tail.split_whitespace().next().unwrap_or_default();
    if lower == "no" {
        // "No. 5" but not "said no. Next"
        return next.starts_with(|c: char| c.is_ascii_digit());
    }
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    let initial = word.chars().count() == 1 && word.chars().all(char::is_uppercase);
    initial && starts_name(next)
}

fn starts_name(word: &str) -> bool {
    let word = word.trim_end_matches(|c: char| !c.is_alphanumeric());
    word.starts_with(char::is_uppercase) && !SENTENCE_STARTERS.contains(&word)
}

/// Split each masked note, numbering sentences `{DocumentID}_{n}` from zero.
pub fn split_notes(notes: &[MaskedNote], splitter: &dyn SentenceSplitter) -> Vec<SentenceRecord> {
    let mut records = Vec::new();
    for note in notes {
        for (idx, sentence) in splitter.split(&note.text).into_iter().enumerate() {
            records.push(SentenceRecord {
                person_id: note.person_id.clone(),
                date: Some(note.date.clone()),
                document_id: note.document_id.clone(),
                sentence_id: format!("{}_{idx}", note.document_id),
                sentence_text: sentence,
            });
        }
    }
    debug!(notes = notes.len(), sentences = records.len(), "split notes");
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let parts = RuleSplitter.split("Slept badly. Pain is worse!  Will call again?");
        assert_eq!(parts, vec!["Slept badly.", "Pain is worse!", "Will call again?"]);
    }

    #[test]
    fn keeps_abbreviations_and_initials() {
        let parts = RuleSplitter.split("Seen by Dr. Smith and J. Doe today. All fine.");
        assert_eq!(parts, vec!["Seen by Dr. Smith and J. Doe today.", "All fine."]);
    }

    #[test]
    fn clause_final_no_ends_the_sentence() {
        let parts = RuleSplitter.split("Patient said no. Next visit booked. Ref No. 5 attached.");
        assert_eq!(
            parts,
            vec!["Patient said no.", "Next visit booked.", "Ref No. 5 attached."]
        );
    }

    #[test]
    fn single_letter_before_a_new_sentence_splits() {
        let parts = RuleSplitter.split("I went to plan B. It worked.");
        assert_eq!(parts, vec!["I went to plan B.", "It worked."]);
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(RuleSplitter.split("   ").is_empty());
    }
}
