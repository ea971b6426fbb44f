use crate::models::*;
use crate::processing::{ImageProcessor, MarksTableBuilder, SubjectScoreExtractor, TextRecognizer};
use crate::scoring::FieldScoringEngine;
use crate::utils::CareerError;
use chrono::Utc;
use log::info;
use sha2::{Digest, Sha256};

/// Marksheet-to-field pipeline around a fixed catalog.
#[derive(Debug, Clone, Default)]
pub struct CareerRecommender {
    catalog: Catalog,
}

impl CareerRecommender {
    pub fn new(catalog: Catalog) -> Self {
        CareerRecommender { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one uploaded marksheet through every stage. Only undecodable
    /// images and recognizer failures are errors; everything downstream
    /// degrades to unknown scores instead.
    pub fn scan_document(
        &self,
        recognizer: &dyn TextRecognizer,
        image_bytes: &[u8],
        personality: &PersonalityMap,
    ) -> Result<DocumentReport, CareerError> {
        let document_id = compute_document_id(image_bytes);
        info!("Scanning document {} ({} bytes)", document_id, image_bytes.len());

        // Step 1: Decode and clean up the scan
        let image = ImageProcessor::preprocess_bytes(image_bytes)?;

        // Step 2: Recognize text fragments
        let tokens = recognizer.recognize(&image)?;
        info!("Recognized {} text fragments", tokens.len());

        // Step 3: Rebuild the marks table
        let parsed = MarksTableBuilder::build(&tokens);
        let table_source = parsed.source();
        let marks = parsed.into_table();

        // Step 4: Score subjects and fields
        let subject_scores = SubjectScoreExtractor::extract(Some(&marks), &self.catalog.subjects);
        let recommendation =
            FieldScoringEngine::recommend(&subject_scores, personality, &self.catalog.subfields);

        Ok(DocumentReport {
            document_id,
            processed_at: Utc::now(),
            raw_texts: tokens.texts(),
            confidences: tokens.confidences(),
            boxes: tokens.boxes(),
            table_source,
            marks,
            subject_scores,
            recommendation,
        })
    }

    /// Score an already-assembled marks table.
    pub fn recommend(&self, marks: &MarksTable, personality: &PersonalityMap) -> Recommendation {
        let subject_scores = SubjectScoreExtractor::extract(Some(marks), &self.catalog.subjects);
        FieldScoringEngine::recommend(&subject_scores, personality, &self.catalog.subfields)
    }

    /// Recommendation for a user who has not uploaded a marksheet yet.
    pub fn quick_recommendation(&self, personality: &PersonalityMap) -> Recommendation {
        info!("No marksheet supplied, scoring against the placeholder table");
        self.recommend(&MarksTable::placeholder(), personality)
    }
}

fn compute_document_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
