use crate::models::{MarksRecord, MarksTable, SubjectScoreMap, SubjectVocabulary};
use log::debug;

/// Resolves free-text subject labels against the canonical vocabulary.
pub struct SubjectScoreExtractor;

impl SubjectScoreExtractor {
    /// Score every canonical subject. Missing tables, unmatched subjects and
    /// records without an obtained mark all come back as unknown.
    pub fn extract(table: Option<&MarksTable>, vocabulary: &SubjectVocabulary) -> SubjectScoreMap {
        let mut scores = SubjectScoreMap::all_unknown(vocabulary.ids());
        let records = match table {
            Some(table) if !table.is_empty() => table.records(),
            _ => return scores,
        };

        let labels: Vec<String> = records.iter().map(|r| r.subject.to_uppercase()).collect();

        for (id, aliases) in vocabulary.iter() {
            if let Some(record) = Self::find_record(records, &labels, aliases) {
                let score = Self::score(record);
                debug!("Subject '{}' matched '{}' -> {:?}", id, record.subject, score);
                scores.set(id, score);
            }
        }

        scores
    }

    // First alias (in order) that hits any record decides; the earliest
    // matching record in table order is taken.
    fn find_record<'a>(records: &'a [MarksRecord], labels: &[String], aliases: &[String]) -> Option<&'a MarksRecord> {
        aliases.iter().find_map(|alias| {
            let needle = alias.to_uppercase();
            labels
                .iter()
                .position(|label| label.contains(&needle))
                .map(|idx| &records[idx])
        })
    }

    fn score(record: &MarksRecord) -> Option<f64> {
        let obtained = record.obtained? as f64;
        match record.maximum {
            Some(max) if max > 0 => Some(obtained / max as f64),
            // No usable maximum: the raw obtained value stands in and may exceed 1.
            _ => Some(obtained),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::{COMPUTER, ENGLISH, MATH, PHYSICS};

    fn table(rows: &[(&str, Option<u64>, Option<u64>)]) -> MarksTable {
        MarksTable::new(
            rows.iter()
                .map(|(s, m, o)| MarksRecord::new(*s, *m, *o))
                .collect(),
        )
    }

    #[test]
    fn test_empty_or_missing_table_is_all_unknown() {
        let vocabulary = SubjectVocabulary::default();
        for scores in [
            SubjectScoreExtractor::extract(None, &vocabulary),
            SubjectScoreExtractor::extract(Some(&MarksTable::default()), &vocabulary),
        ] {
            assert_eq!(scores.len(), 9);
            assert_eq!(scores.known_count(), 0);
            for id in vocabulary.ids() {
                assert!(scores.contains(id));
            }
        }
    }

    #[test]
    fn test_ratios_for_matched_subjects() {
        let marks = table(&[
            ("MATHEMATICS", Some(100), Some(90)),
            ("PHYSICS", Some(100), Some(70)),
            ("ENGLISH", Some(100), Some(95)),
        ]);
        let scores = SubjectScoreExtractor::extract(Some(&marks), &SubjectVocabulary::default());
        assert_eq!(scores.get(MATH), Some(0.9));
        assert_eq!(scores.get(PHYSICS), Some(0.7));
        assert_eq!(scores.get(ENGLISH), Some(0.95));
        assert_eq!(scores.get(COMPUTER), None);
        assert_eq!(scores.known_count(), 3);
    }

    #[test]
    fn test_case_insensitive_alias_and_first_record() {
        let marks = table(&[
            ("Applied Maths", Some(50), Some(25)),
            ("mathematics", Some(100), Some(100)),
        ]);
        let scores = SubjectScoreExtractor::extract(Some(&marks), &SubjectVocabulary::default());
        assert_eq!(scores.get(MATH), Some(0.5));
    }

    #[test]
    fn test_alias_order_beats_table_order() {
        let mut subjects = std::collections::BTreeMap::new();
        subjects.insert("cs".to_string(), vec!["COMPUTER".to_string(), "ICT".to_string()]);
        let vocabulary = SubjectVocabulary::new(subjects).unwrap();
        let marks = table(&[("ICT", Some(100), Some(40)), ("Computer", Some(100), Some(80))]);
        let scores = SubjectScoreExtractor::extract(Some(&marks), &vocabulary);
        assert_eq!(scores.get("cs"), Some(0.8));
    }

    #[test]
    fn test_missing_or_zero_maximum_uses_raw_obtained() {
        let marks = table(&[("Physics", None, Some(72)), ("English", Some(0), Some(40))]);
        let scores = SubjectScoreExtractor::extract(Some(&marks), &SubjectVocabulary::default());
        assert_eq!(scores.get(PHYSICS), Some(72.0));
        assert_eq!(scores.get(ENGLISH), Some(40.0));
    }

    #[test]
    fn test_missing_obtained_is_unknown() {
        let marks = table(&[("Physics", Some(100), None)]);
        let scores = SubjectScoreExtractor::extract(Some(&marks), &SubjectVocabulary::default());
        assert_eq!(scores.get(PHYSICS), None);
        assert!(scores.contains(PHYSICS));
    }
}
