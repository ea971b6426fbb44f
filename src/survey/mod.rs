//! Questionnaire scoring: RIASEC interest inventory and TCI temperament
//! answers folded into a [`PersonalityMap`].

pub mod riasec;
pub mod tci;

pub use riasec::RiasecBank;
pub use tci::TciBank;

use crate::models::PersonalityMap;
use crate::utils::CareerError;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Answers keyed by question id, as a questionnaire front-end submits them.
pub type SurveyAnswers = BTreeMap<String, Value>;

/// Likert answers run 0..=5.
const LIKERT_MAX: f64 = 5.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyAggregate {
    pub riasec: BTreeMap<String, f64>,
    pub tci: BTreeMap<String, f64>,
}

impl SurveyAggregate {
    /// Both aggregates are already on [0, 1]; TCI traits win on key clash.
    pub fn personality_map(&self) -> PersonalityMap {
        let mut map: PersonalityMap = self.riasec.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let tci: PersonalityMap = self.tci.iter().map(|(k, v)| (k.clone(), *v)).collect();
        map.merge(&tci);
        map
    }
}

/// Load an answers object (`{"riasec_1": 4, "tci_0": "3"}`) from disk.
pub fn load_answers(path: &Path) -> Result<SurveyAnswers, CareerError> {
    let json = std::fs::read_to_string(path).map_err(|e| CareerError::io(path, e))?;
    let answers = parse_answers(&json)?;
    info!("Loaded {} answers from {}", answers.len(), path.display());
    Ok(answers)
}

pub fn parse_answers(json: &str) -> Result<SurveyAnswers, CareerError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(CareerError::Survey(format!(
            "answers must be a JSON object keyed by question id, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn answer_value(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Group answers by the label their question maps to and average each group
/// onto [0, 1]. Unknown question ids and unparseable answers are skipped.
fn mean_by_label(labels: &BTreeMap<String, String>, answers: &SurveyAnswers) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (qid, raw) in answers {
        let label = match labels.get(qid) {
            Some(label) => label,
            None => {
                debug!("Skipping answer for unknown question '{}'", qid);
                continue;
            }
        };
        match answer_value(raw) {
            Some(v) => groups.entry(label.clone()).or_default().push(v),
            None => debug!("Skipping unparseable answer {} for '{}'", raw, qid),
        }
    }

    groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(label, values)| {
            let mean = values.iter().sum::<f64>() / (values.len() as f64 * LIKERT_MAX);
            (label, mean)
        })
        .collect()
}

/// Question bank rows with trimmed headers and cells.
struct BankRows {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl BankRows {
    fn read<R: Read>(reader: R, bank: &str) -> Result<Self, CareerError> {
        let mut csv = ReaderBuilder::new().trim(Trim::All).flexible(true).from_reader(reader);
        let headers = csv
            .headers()
            .map_err(|e| CareerError::Survey(format!("{} question bank: {}", bank, e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = csv
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CareerError::Survey(format!("{} question bank: {}", bank, e)))?;
        Ok(BankRows { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    fn cell(row: &StringRecord, column: Option<usize>) -> Option<&str> {
        column.and_then(|c| row.get(c)).filter(|s| !s.is_empty())
    }
}

fn open_bank(path: &Path) -> Result<std::fs::File, CareerError> {
    std::fs::File::open(path).map_err(|e| CareerError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_values() {
        assert_eq!(answer_value(&json!(4)), Some(4.0));
        assert_eq!(answer_value(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(answer_value(&json!(true)), Some(1.0));
        assert_eq!(answer_value(&json!("often")), None);
        assert_eq!(answer_value(&json!(null)), None);
    }

    #[test]
    fn test_answers_must_be_object() {
        assert_eq!(parse_answers(r#"{"tci_0": 3}"#).unwrap().len(), 1);
        let err = parse_answers("[1, 2]").unwrap_err();
        assert!(matches!(err, CareerError::Survey(_)));
        assert!(parse_answers("{not json").is_err());
    }

    #[test]
    fn test_tci_wins_on_key_clash() {
        let mut aggregate = SurveyAggregate::default();
        aggregate.riasec.insert("I".to_string(), 0.4);
        aggregate.riasec.insert("openness".to_string(), 0.2);
        aggregate.tci.insert("openness".to_string(), 0.9);
        let map = aggregate.personality_map();
        assert_eq!(map.get("I"), Some(0.4));
        assert_eq!(map.get("openness"), Some(0.9));
        assert_eq!(map.len(), 2);
    }
}
