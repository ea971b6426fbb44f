pub mod field;
pub mod personality;

pub use field::FieldScoringEngine;
pub use personality::PersonalityNormalizer;
