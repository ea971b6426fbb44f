// Reconstructs a (Subject, Maximum, Obtained) table from recognized tokens.
//
// Pairing relies purely on recognition order. Token geometry is carried in
// the buffer but not consulted, so multi-column marksheets can pair a label
// with numbers from a neighbouring column.

use crate::models::{MarksRecord, MarksTable, ParsedTable, TokenBuffer};
use crate::processing::numeric::extract_number;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

lazy_static! {
    static ref SUBJECT_LETTERS: Regex = Regex::new(r"[A-Za-z]{2,}").unwrap();
    static ref FALLBACK_DELIMITERS: Regex = Regex::new(r"[:\-]").unwrap();
}

/// Tokens examined after a subject label when looking for its two marks.
pub const SCAN_WINDOW: usize = 6;

const HEADER_MARKER: &str = "MARK";

pub struct MarksTableBuilder;

impl MarksTableBuilder {
    pub fn build(tokens: &TokenBuffer) -> ParsedTable {
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        let primary = Self::primary_pass(&texts);
        if !primary.is_empty() {
            info!("Primary pass paired {} subject rows", primary.len());
            return ParsedTable::Primary(MarksTable::new(primary));
        }

        let fallback = Self::fallback_pass(&texts);
        if !fallback.is_empty() {
            warn!(
                "Primary pass found no subject rows, delimiter fallback recovered {}",
                fallback.len()
            );
            return ParsedTable::Fallback(MarksTable::new(fallback));
        }

        warn!("No marks recovered from {} tokens", texts.len());
        ParsedTable::Empty
    }

    fn is_subject_label(text: &str) -> bool {
        SUBJECT_LETTERS.is_match(text) && !text.to_uppercase().contains(HEADER_MARKER)
    }

    fn primary_pass(texts: &[&str]) -> Vec<MarksRecord> {
        let mut records = Vec::new();
        let mut i = 0;

        while i < texts.len() {
            let label = texts[i].trim();
            if label.chars().count() < 2 || !Self::is_subject_label(label) {
                i += 1;
                continue;
            }

            let mut numbers = Vec::with_capacity(2);
            let mut j = i + 1;
            while j < texts.len() && j - (i + 1) < SCAN_WINDOW && numbers.len() < 2 {
                if let Some(n) = extract_number(texts[j]) {
                    numbers.push(n);
                }
                j += 1;
            }

            if numbers.len() == 2 {
                debug!(
                    "Paired '{}' with {:?} (tokens {}..{})",
                    label,
                    numbers,
                    i + 1,
                    j
                );
                records.push(MarksRecord::new(
                    label,
                    Some(numbers[0].truncate()),
                    Some(numbers[1].truncate()),
                ));
                i = j;
            } else {
                debug!("Discarding candidate '{}': {} number(s) in window", label, numbers.len());
                i += 1;
            }
        }

        records
    }

    fn fallback_pass(texts: &[&str]) -> Vec<MarksRecord> {
        let mut records = Vec::new();

        for text in texts {
            let parts: Vec<&str> = FALLBACK_DELIMITERS.split(text).collect();
            if parts.len() < 2 {
                continue;
            }
            let numbers: Vec<_> = parts.iter().filter_map(|p| extract_number(p)).collect();
            if numbers.is_empty() {
                continue;
            }
            debug!("Fallback split '{}' into {:?}", text, parts);
            records.push(MarksRecord::new(
                parts[0].trim(),
                numbers.first().map(|n| n.truncate()),
                numbers.get(1).map(|n| n.truncate()),
            ));
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableSource;

    fn build(texts: &[&str]) -> ParsedTable {
        MarksTableBuilder::build(&TokenBuffer::from_texts(texts.iter().copied()))
    }

    #[test]
    fn test_header_skipped_and_rows_paired() {
        let parsed = build(&["MARKS OBTAINED", "Chemistry", "100", "85", "Biology", "50", "40"]);
        assert_eq!(parsed.source(), TableSource::Primary);
        assert_eq!(
            parsed.records(),
            &[
                MarksRecord::new("Chemistry", Some(100), Some(85)),
                MarksRecord::new("Biology", Some(50), Some(40)),
            ]
        );
    }

    #[test]
    fn test_noise_between_label_and_marks() {
        let parsed = build(&["English", "Theory", "1,00", "x", "78.6"]);
        // "Theory" is a non-numeric token inside the window and is skipped.
        assert_eq!(parsed.records(), &[MarksRecord::new("English", Some(100), Some(78))]);
    }

    #[test]
    fn test_single_character_numbers_are_consumed_in_window() {
        let parsed = build(&["Urdu", "9", "7"]);
        assert_eq!(parsed.records(), &[MarksRecord::new("Urdu", Some(9), Some(7))]);
    }

    #[test]
    fn test_candidate_without_two_numbers_is_retried_on_next_token() {
        let parsed = build(&["Name", "Physics", "100", "66"]);
        // "Name" sees only 100 and 66 as well, so it wins the pairing.
        assert_eq!(parsed.records(), &[MarksRecord::new("Name", Some(100), Some(66))]);

        let parsed = build(&["Roll", "a", "b", "c", "d", "e", "f", "Physics", "100", "66"]);
        assert_eq!(parsed.records(), &[MarksRecord::new("Physics", Some(100), Some(66))]);
    }

    #[test]
    fn test_window_limit() {
        let parsed = build(&["Math", "-", "-", "-", "-", "-", "90", "100"]);
        // Only the first six tokens after the label are examined; the label
        // falls through and nothing else qualifies as a subject.
        assert_eq!(parsed.source(), TableSource::Empty);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let parsed = build(&["Math", "100", "90", "Math", "100", "80"]);
        assert_eq!(parsed.records().len(), 2);
    }

    #[test]
    fn test_fallback_on_delimited_tokens() {
        let parsed = build(&["Physics: 75", "Chemistry - 100 - 64", "Remarks: good"]);
        assert_eq!(parsed.source(), TableSource::Fallback);
        assert_eq!(
            parsed.records(),
            &[
                MarksRecord::new("Physics", Some(75), None),
                MarksRecord::new("Chemistry", Some(100), Some(64)),
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(build(&[]), ParsedTable::Empty);
        assert_eq!(build(&["", "a", "Signature"]), ParsedTable::Empty);
    }

    #[test]
    fn test_output_bounded_by_input() {
        let texts = ["Math", "1", "2", "Eng", "3", "4", "5", "Bio:6", "x-7"];
        let parsed = build(&texts);
        assert!(parsed.records().len() <= texts.len());
    }
}
