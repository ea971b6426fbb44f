use super::{mean_by_label, open_bank, BankRows, SurveyAnswers};
use crate::utils::CareerError;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const QID_PREFIX: &str = "riasec_";
pub const CATEGORIES: [&str; 6] = ["R", "I", "A", "S", "E", "C"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiasecQuestion {
    pub qid: String,
    pub text: String,
    pub category: Option<String>,
}

/// Holland-code interest inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiasecBank {
    questions: Vec<RiasecQuestion>,
}

impl RiasecBank {
    /// Reads a bank with a `question` column and optional `category` and
    /// `id` columns (header names are matched case-insensitively).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CareerError> {
        let bank = BankRows::read(reader, "RIASEC")?;
        let question_col = bank.column("question").ok_or_else(|| {
            CareerError::Survey("RIASEC question bank must include a 'question' column".to_string())
        })?;
        let category_col = bank.column("category");
        let id_col = bank.column("id");

        let questions = bank
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let unique = match BankRows::cell(row, id_col) {
                    Some(id) => id.to_string(),
                    None => idx.to_string(),
                };
                RiasecQuestion {
                    qid: format!("{}{}", QID_PREFIX, unique),
                    text: row.get(question_col).unwrap_or_default().to_string(),
                    category: BankRows::cell(row, category_col).map(|c| c.to_uppercase()),
                }
            })
            .collect();

        Ok(RiasecBank { questions })
    }

    pub fn from_path(path: &Path) -> Result<Self, CareerError> {
        let bank = Self::from_reader(open_bank(path)?)?;
        info!("Loaded {} RIASEC questions from {}", bank.len(), path.display());
        Ok(bank)
    }

    pub fn questions(&self) -> &[RiasecQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Mean answer per category on [0, 1]; all six codes are always present.
    pub fn aggregate(&self, answers: &SurveyAnswers) -> BTreeMap<String, f64> {
        // A repeated id keeps the category of its last row.
        let labels: BTreeMap<String, String> = self
            .questions
            .iter()
            .filter_map(|q| q.category.clone().map(|c| (q.qid.clone(), c)))
            .collect();

        let mut aggregate = mean_by_label(&labels, answers);
        for code in CATEGORIES {
            aggregate.entry(code.to_string()).or_insert(0.0);
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::parse_answers;

    const BANK: &str = " ID , Question ,Category\n\
        1,I like fixing engines,r\n\
        2,I enjoy solving puzzles,I\n\
        3,I like to paint,A\n\
        4,I enjoy lab experiments,I\n";

    #[test]
    fn test_ids_come_from_id_column() {
        let bank = RiasecBank::from_reader(BANK.as_bytes()).unwrap();
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.questions()[0].qid, "riasec_1");
        assert_eq!(bank.questions()[0].category.as_deref(), Some("R"));
    }

    #[test]
    fn test_ids_fall_back_to_row_index() {
        let bank = RiasecBank::from_reader("question,category\nA,S\nB,E\n".as_bytes()).unwrap();
        let qids: Vec<&str> = bank.questions().iter().map(|q| q.qid.as_str()).collect();
        assert_eq!(qids, vec!["riasec_0", "riasec_1"]);
    }

    #[test]
    fn test_question_column_required() {
        let err = RiasecBank::from_reader("id,category\n1,R\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CareerError::Survey(_)));
    }

    #[test]
    fn test_aggregate_means_and_defaults() {
        let bank = RiasecBank::from_reader(BANK.as_bytes()).unwrap();
        let answers = parse_answers(
            r#"{"riasec_1": 5, "riasec_2": "4", "riasec_4": 2, "riasec_3": "n/a", "riasec_99": 5, "tci_0": 1}"#,
        )
        .unwrap();
        let agg = bank.aggregate(&answers);

        assert_eq!(agg.len(), 6);
        assert_eq!(agg["R"], 1.0);
        assert!((agg["I"] - 0.6).abs() < 1e-12);
        assert_eq!(agg["A"], 0.0);
        assert_eq!(agg["S"], 0.0);
    }

    #[test]
    fn test_questions_without_category_are_ignored() {
        let bank = RiasecBank::from_reader("id,question\n1,Anything\n".as_bytes()).unwrap();
        let agg = bank.aggregate(&parse_answers(r#"{"riasec_1": 5}"#).unwrap());
        assert!(agg.values().all(|v| *v == 0.0));
    }
}
