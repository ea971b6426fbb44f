use crate::models::rules::{BIOLOGY, CHEMISTRY, COMPUTER, ENGLISH, MATH, PHYSICS, URDU};
use crate::models::{Field, PersonalityMap, Recommendation, SubfieldTable, SubjectScoreMap};
use log::{debug, info};
use std::collections::BTreeMap;

pub const OPENNESS: &str = "openness";
pub const CONSCIENTIOUSNESS: &str = "conscientiousness";

// Hand-tuned weights; kept exactly for behavioural compatibility.
const STEM_WEIGHTS: [(&str, f64); 4] = [(MATH, 0.35), (PHYSICS, 0.25), (CHEMISTRY, 0.15), (COMPUTER, 0.25)];
const ARTS_WEIGHTS: [(&str, f64); 3] = [(ENGLISH, 0.5), (URDU, 0.3), (BIOLOGY, 0.2)];
const COMMERCE_WEIGHTS: [(&str, f64); 3] = [(MATH, 0.5), (ENGLISH, 0.3), (COMPUTER, 0.2)];

/// (baseline, slope, trait) for the personality multiplier of each field.
const STEM_MULTIPLIER: (f64, f64, &str) = (0.7, 0.3, OPENNESS);
const ARTS_MULTIPLIER: (f64, f64, &str) = (0.6, 0.4, OPENNESS);
const COMMERCE_MULTIPLIER: (f64, f64, &str) = (0.6, 0.4, CONSCIENTIOUSNESS);

/// Rule-based combination of academic and personality signals.
pub struct FieldScoringEngine;

impl FieldScoringEngine {
    pub fn recommend(
        scores: &SubjectScoreMap,
        personality: &PersonalityMap,
        subfields: &SubfieldTable,
    ) -> Recommendation {
        let raw = Self::raw_scores(scores, personality);
        let normalized = Self::normalize(&raw);

        // Strictly-greater keeps the first maximum in STEM > ARTS > COMMERCE order.
        let mut best_field = Field::Stem;
        for field in Field::ALL {
            if normalized[&field] > normalized[&best_field] {
                best_field = field;
            }
        }

        info!(
            "Recommended {} (STEM {:.3}, ARTS {:.3}, COMMERCE {:.3})",
            best_field,
            normalized[&Field::Stem],
            normalized[&Field::Arts],
            normalized[&Field::Commerce]
        );

        Recommendation::new(best_field, subfields.subfields(best_field).to_vec(), normalized)
    }

    /// Personality-adjusted composites before normalization, floored at 0.
    pub fn raw_scores(scores: &SubjectScoreMap, personality: &PersonalityMap) -> BTreeMap<Field, f64> {
        let mut raw = BTreeMap::new();
        raw.insert(Field::Stem, Self::composite(scores, personality, &STEM_WEIGHTS, STEM_MULTIPLIER));
        raw.insert(Field::Arts, Self::composite(scores, personality, &ARTS_WEIGHTS, ARTS_MULTIPLIER));
        raw.insert(
            Field::Commerce,
            Self::composite(scores, personality, &COMMERCE_WEIGHTS, COMMERCE_MULTIPLIER),
        );
        debug!("Raw field scores: {:?}", raw);
        raw
    }

    fn composite(
        scores: &SubjectScoreMap,
        personality: &PersonalityMap,
        weights: &[(&str, f64)],
        (base, slope, trait_name): (f64, f64, &str),
    ) -> f64 {
        let academic: f64 = weights
            .iter()
            .map(|(subject, weight)| Self::subject_value(scores, subject) * weight)
            .sum();
        let multiplier = base + slope * personality.get_or_zero(trait_name);
        (academic * multiplier).max(0.0)
    }

    fn normalize(raw: &BTreeMap<Field, f64>) -> BTreeMap<Field, f64> {
        let sum: f64 = raw.values().sum();
        let total = if sum > 0.0 { sum } else { 1.0 };
        raw.iter()
            .map(|(field, value)| (*field, round3(value / total)))
            .collect()
    }

    // Unknown or non-finite inputs contribute nothing.
    fn subject_value(scores: &SubjectScoreMap, subject: &str) -> f64 {
        let value = scores.score_or_zero(subject);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

// Rounds the exact decimal value of the double, ties to even.
fn round3(value: f64) -> f64 {
    format!("{:.3}", value).parse().unwrap_or(value)
}
