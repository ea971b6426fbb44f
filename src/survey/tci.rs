use super::{mean_by_label, open_bank, BankRows, SurveyAnswers};
use crate::utils::CareerError;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const QID_PREFIX: &str = "tci_";
const DEFAULT_TRAIT: &str = "trait";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TciQuestion {
    pub qid: String,
    pub text: String,
    pub trait_name: String,
}

/// Temperament and Character Inventory question bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TciBank {
    questions: Vec<TciQuestion>,
}

impl TciBank {
    /// The question column is `question` or else the first column; the trait
    /// column is `trait` or else the second. Question ids are `tci_<row>`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CareerError> {
        let bank = BankRows::read(reader, "TCI")?;
        if bank.headers.is_empty() {
            return Err(CareerError::Survey(
                "TCI question bank must include a question column".to_string(),
            ));
        }
        let question_col = bank.column("question").unwrap_or(0);
        let trait_col = bank.column(DEFAULT_TRAIT);
        let second_col = (bank.headers.len() > 1).then_some(1);

        let questions = bank
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let trait_name = BankRows::cell(row, trait_col)
                    .or_else(|| match second_col {
                        Some(col) => Some(row.get(col).unwrap_or_default()),
                        None => Some(DEFAULT_TRAIT),
                    })
                    .unwrap_or_default();
                TciQuestion {
                    qid: format!("{}{}", QID_PREFIX, idx),
                    text: row.get(question_col).unwrap_or_default().to_string(),
                    trait_name: trait_name.trim().to_string(),
                }
            })
            .collect();

        Ok(TciBank { questions })
    }

    pub fn from_path(path: &Path) -> Result<Self, CareerError> {
        let bank = Self::from_reader(open_bank(path)?)?;
        info!("Loaded {} TCI questions from {}", bank.len(), path.display());
        Ok(bank)
    }

    pub fn questions(&self) -> &[TciQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Mean answer per trait on [0, 1]. Only answered traits appear.
    pub fn aggregate(&self, answers: &SurveyAnswers) -> BTreeMap<String, f64> {
        let labels: BTreeMap<String, String> = self
            .questions
            .iter()
            .filter(|q| !q.trait_name.is_empty())
            .map(|q| (q.qid.clone(), q.trait_name.clone()))
            .collect();
        mean_by_label(&labels, answers)
    }
}
