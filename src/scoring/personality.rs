use crate::models::PersonalityMap;
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

/// Rescales trait values of unknown origin onto [0, 1].
///
/// Upstream questionnaires emit either 0-5 Likert scores or 0-100
/// percentages without saying which, so the magnitude picks the scale:
/// `<= 5` is Likert, `(5, 100]` is a percentage, anything above 100 saturates.
pub struct PersonalityNormalizer;

impl PersonalityNormalizer {
    pub fn normalize(raw: &BTreeMap<String, Value>) -> PersonalityMap {
        let mut normalized = PersonalityMap::new();
        for (name, value) in raw {
            let scaled = Self::parse(value).map(Self::normalize_value).unwrap_or(0.0);
            debug!("Trait '{}': {} -> {}", name, value, scaled);
            normalized.insert(name.clone(), scaled);
        }
        normalized
    }

    pub fn normalize_value(value: f64) -> f64 {
        if value.is_nan() || value < 0.0 {
            return 0.0;
        }
        if value <= 5.0 {
            value / 5.0
        } else if value <= 100.0 {
            value / 100.0
        } else {
            1.0_f64.min(value / 100.0)
        }
    }

    fn parse(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}
