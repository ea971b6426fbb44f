use crate::models::Field;
use crate::utils::CareerError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const MATH: &str = "math";
pub const PHYSICS: &str = "physics";
pub const CHEMISTRY: &str = "chemistry";
pub const BIOLOGY: &str = "biology";
pub const COMPUTER: &str = "computer";
pub const ENGLISH: &str = "english";
pub const URDU: &str = "urdu";
pub const ISLAMIAT: &str = "islamiat";
pub const PAK_STUDIES: &str = "pakstudies";

/// Canonical subject id -> ordered, case-insensitive substring aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectVocabulary {
    subjects: BTreeMap<String, Vec<String>>,
}

impl SubjectVocabulary {
    pub fn new(subjects: BTreeMap<String, Vec<String>>) -> Result<Self, CareerError> {
        let vocabulary = SubjectVocabulary { subjects };
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    fn validate(&self) -> Result<(), CareerError> {
        if self.subjects.is_empty() {
            return Err(CareerError::Config("Subject vocabulary is empty".to_string()));
        }
        for (id, aliases) in &self.subjects {
            if id.trim().is_empty() {
                return Err(CareerError::Config("Subject vocabulary contains a blank id".to_string()));
            }
            if aliases.is_empty() || aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(CareerError::Config(format!(
                    "Subject '{}' needs at least one non-blank alias",
                    id
                )));
            }
        }
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.subjects.iter().map(|(id, aliases)| (id.as_str(), aliases.as_slice()))
    }

    pub fn aliases(&self, id: &str) -> Option<&[String]> {
        self.subjects.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl Default for SubjectVocabulary {
    fn default() -> Self {
        // Two-letter aliases such as "IT"/"CS" are left out: as substrings they
        // hit MATHEMATICS, PHYSICS and similar labels.
        let table: [(&str, &[&str]); 9] = [
            (MATH, &["MATH", "MATHEMATICS"]),
            (PHYSICS, &["PHYSICS", "PHYS"]),
            (CHEMISTRY, &["CHEMISTRY", "CHEM"]),
            (BIOLOGY, &["BIOLOGY", "BIO"]),
            (COMPUTER, &["COMPUTER", "COMPUTER SCIENCE", "COMP SCI", "INFORMATION TECHNOLOGY"]),
            (ENGLISH, &["ENGLISH", "ENG"]),
            (URDU, &["URDU"]),
            (ISLAMIAT, &["ISLAMIYAT", "ISLAMIAT"]),
            (PAK_STUDIES, &["PAKISTAN STUDIES", "PAK STUDIES", "PAK STUD"]),
        ];
        let subjects = table
            .iter()
            .map(|(id, aliases)| {
                (
                    id.to_string(),
                    aliases.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        SubjectVocabulary { subjects }
    }
}

/// Field -> ordered subfield display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubfieldTable {
    subfields: BTreeMap<Field, Vec<String>>,
}

impl SubfieldTable {
    pub fn new(subfields: BTreeMap<Field, Vec<String>>) -> Result<Self, CareerError> {
        let table = SubfieldTable { subfields };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), CareerError> {
        for field in Field::ALL {
            if !self.subfields.contains_key(&field) {
                return Err(CareerError::Config(format!("Subfield table is missing {}", field)));
            }
        }
        Ok(())
    }

    pub fn subfields(&self, field: Field) -> &[String] {
        self.subfields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for SubfieldTable {
    fn default() -> Self {
        let table: [(Field, &[&str]); 3] = [
            (Field::Stem, &["Engineering", "Computer Science", "Pharmacy", "Medicine"]),
            (Field::Arts, &["Design", "Fine Arts", "Journalism", "Languages"]),
            (Field::Commerce, &["Finance", "Accounting", "Business", "Economics"]),
        ];
        let subfields = table
            .iter()
            .map(|(field, names)| (*field, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        SubfieldTable { subfields }
    }
}

/// Static configuration consumed by the extractor and the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub subjects: SubjectVocabulary,
    pub subfields: SubfieldTable,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, CareerError> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| CareerError::Config(format!("Malformed catalog: {}", e)))?;
        catalog.subjects.validate()?;
        catalog.subfields.validate()?;
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CareerError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CareerError::Config(format!("Cannot read catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            "Loaded catalog from {} ({} subjects)",
            path.display(),
            catalog.subjects.len()
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_has_nine_subjects() {
        let vocabulary = SubjectVocabulary::default();
        assert_eq!(vocabulary.len(), 9);
        assert!(vocabulary.validate().is_ok());
        assert_eq!(
            vocabulary.aliases(PHYSICS).unwrap(),
            &["PHYSICS".to_string(), "PHYS".to_string()]
        );
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "subjects": {"math": ["MATH"], "geography": ["GEOG", "GEOGRAPHY"]},
            "subfields": {"STEM": ["Engineering"], "ARTS": [], "COMMERCE": ["Finance"]}
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.subjects.len(), 2);
        assert_eq!(catalog.subjects.aliases("geography").unwrap().len(), 2);
        assert!(catalog.subfields.subfields(Field::Arts).is_empty());
        assert_eq!(catalog.subfields.subfields(Field::Stem), &["Engineering".to_string()]);
    }

    #[test]
    fn test_catalog_missing_field_is_config_error() {
        let json = r#"{
            "subjects": {"math": ["MATH"]},
            "subfields": {"STEM": ["Engineering"], "ARTS": ["Design"]}
        }"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CareerError::Config(_)));
    }

    #[test]
    fn test_catalog_rejects_blank_alias() {
        let json = r#"{
            "subjects": {"math": ["  "]},
            "subfields": {"STEM": [], "ARTS": [], "COMMERCE": []}
        }"#;
        assert!(Catalog::from_json_str(json).is_err());
        assert!(Catalog::from_json_str("not json").is_err());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        assert!(SubjectVocabulary::new(BTreeMap::new()).is_err());
    }
}
