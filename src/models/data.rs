use crate::utils::CareerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

pub type Point = (f32, f32);

/// One recognized text fragment as handed back by the recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    pub bbox: [Point; 4],
    pub confidence: f32,
}

impl TextToken {
    pub fn new(text: impl Into<String>, bbox: [Point; 4], confidence: f32) -> Self {
        TextToken {
            text: text.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Axis-aligned box given as left/top/width/height, the way Tesseract reports it.
    pub fn from_rect(text: impl Into<String>, left: f32, top: f32, width: f32, height: f32, confidence: f32) -> Self {
        let right = left + width;
        let bottom = top + height;
        Self::new(
            text,
            [(left, top), (right, top), (right, bottom), (left, bottom)],
            confidence,
        )
    }
}

/// Tokens in recognition scan order. Not necessarily reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenBuffer {
    tokens: Vec<TextToken>,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<TextToken>) -> Self {
        TokenBuffer { tokens }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = texts
            .into_iter()
            .map(|t| TextToken::new(t, [(0.0, 0.0); 4], 1.0))
            .collect();
        TokenBuffer { tokens }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.text.clone()).collect()
    }

    pub fn confidences(&self) -> Vec<f32> {
        self.tokens.iter().map(|t| t.confidence).collect()
    }

    pub fn boxes(&self) -> Vec<[Point; 4]> {
        self.tokens.iter().map(|t| t.bbox).collect()
    }

    /// Accepts a JSON array of full tokens, bare strings, or a mix of both.
    pub fn from_json_str(json: &str) -> Result<Self, CareerError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Text(String),
            Token(TextToken),
        }

        let entries: Vec<Entry> = serde_json::from_str(json)?;
        let tokens = entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Text(text) => TextToken::new(text, [(0.0, 0.0); 4], 1.0),
                Entry::Token(token) => TextToken::new(token.text, token.bbox, token.confidence),
            })
            .collect();
        Ok(TokenBuffer { tokens })
    }
}

impl<'a> IntoIterator for &'a TokenBuffer {
    type Item = &'a TextToken;
    type IntoIter = std::slice::Iter<'a, TextToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// A single (Subject, Maximum, Obtained) row recovered from a marksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksRecord {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Maximum", default, deserialize_with = "deserialize_mark")]
    pub maximum: Option<u64>,
    #[serde(rename = "Obtained", default, deserialize_with = "deserialize_mark")]
    pub obtained: Option<u64>,
}

impl MarksRecord {
    pub fn new(subject: impl Into<String>, maximum: Option<u64>, obtained: Option<u64>) -> Self {
        MarksRecord {
            subject: subject.into(),
            maximum,
            obtained,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMark {
    Whole(u64),
    Real(f64),
    Text(String),
}

fn mark_from_real<E: serde::de::Error>(value: f64) -> Result<Option<u64>, E> {
    if !value.is_finite() || value < 0.0 {
        return Err(E::custom(format!("invalid mark value: {}", value)));
    }
    Ok(Some(value.trunc() as u64))
}

// Tables exported by spreadsheet tools often carry "85.0" once a column has gaps.
fn deserialize_mark<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawMark>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawMark::Whole(value)) => Ok(Some(value)),
        Some(RawMark::Real(value)) => mark_from_real(value),
        Some(RawMark::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            if let Ok(whole) = text.parse::<u64>() {
                return Ok(Some(whole));
            }
            let value = text.parse::<f64>().map_err(serde::de::Error::custom)?;
            mark_from_real(value)
        }
    }
}

const TABLE_HEADER: [&str; 3] = ["Subject", "Maximum", "Obtained"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarksTable {
    records: Vec<MarksRecord>,
}

impl MarksTable {
    pub fn new(records: Vec<MarksRecord>) -> Self {
        MarksTable { records }
    }

    /// Stand-in table scored when no marksheet was provided.
    pub fn placeholder() -> Self {
        MarksTable::new(vec![MarksRecord::new("_default_", Some(100), Some(50))])
    }

    pub fn records(&self) -> &[MarksRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), CareerError> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        wtr.write_record(TABLE_HEADER)?;
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, CareerError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self, CareerError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let records = rdr
            .deserialize::<MarksRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MarksTable { records })
    }
}

/// Which heuristic produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    Primary,
    Fallback,
    Empty,
}

/// Output of the marks table builder, tagged by the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTable {
    Primary(MarksTable),
    Fallback(MarksTable),
    Empty,
}

impl ParsedTable {
    pub fn source(&self) -> TableSource {
        match self {
            ParsedTable::Primary(_) => TableSource::Primary,
            ParsedTable::Fallback(_) => TableSource::Fallback,
            ParsedTable::Empty => TableSource::Empty,
        }
    }

    pub fn records(&self) -> &[MarksRecord] {
        match self {
            ParsedTable::Primary(table) | ParsedTable::Fallback(table) => table.records(),
            ParsedTable::Empty => &[],
        }
    }

    pub fn into_table(self) -> MarksTable {
        match self {
            ParsedTable::Primary(table) | ParsedTable::Fallback(table) => table,
            ParsedTable::Empty => MarksTable::default(),
        }
    }
}

/// Canonical subject id -> ratio, `None` meaning unknown. Every id of the
/// vocabulary it was built from is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubjectScoreMap {
    scores: BTreeMap<String, Option<f64>>,
}

impl SubjectScoreMap {
    pub fn all_unknown<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let scores = ids.into_iter().map(|id| (id.to_string(), None)).collect();
        SubjectScoreMap { scores }
    }

    pub(crate) fn set(&mut self, id: &str, score: Option<f64>) {
        if let Some(slot) = self.scores.get_mut(id) {
            *slot = score;
        }
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.scores.get(id).copied().flatten()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scores.contains_key(id)
    }

    /// Unknown and missing ids both count as zero.
    pub fn score_or_zero(&self, id: &str) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn known_count(&self) -> usize {
        self.scores.values().filter(|s| s.is_some()).count()
    }
}

/// Trait name -> value in [0, 1]. Keys are whatever the questionnaires define.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalityMap {
    traits: BTreeMap<String, f64>,
}

impl PersonalityMap {
    pub fn new() -> Self {
        PersonalityMap::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.traits.insert(name.into(), value);
    }

    /// Later entries overwrite earlier ones on key clash.
    pub fn merge(&mut self, other: &PersonalityMap) {
        for (name, value) in &other.traits {
            self.traits.insert(name.clone(), *value);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.traits.get(name).copied()
    }

    pub fn get_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.traits.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for PersonalityMap {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut map = PersonalityMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Candidate academic fields. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Field {
    Stem,
    Arts,
    Commerce,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Stem, Field::Arts, Field::Commerce];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Stem => "STEM",
            Field::Arts => "ARTS",
            Field::Commerce => "COMMERCE",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = CareerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STEM" => Ok(Field::Stem),
            "ARTS" => Ok(Field::Arts),
            "COMMERCE" => Ok(Field::Commerce),
            other => Err(CareerError::Config(format!("Unknown field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    best_field: Field,
    best_subfields: Vec<String>,
    scores: BTreeMap<Field, f64>,
}

impl Recommendation {
    pub(crate) fn new(best_field: Field, best_subfields: Vec<String>, scores: BTreeMap<Field, f64>) -> Self {
        Recommendation {
            best_field,
            best_subfields,
            scores,
        }
    }

    pub fn best_field(&self) -> Field {
        self.best_field
    }

    pub fn best_subfields(&self) -> &[String] {
        &self.best_subfields
    }

    pub fn scores(&self) -> &BTreeMap<Field, f64> {
        &self.scores
    }

    pub fn score(&self, field: Field) -> f64 {
        self.scores.get(&field).copied().unwrap_or(0.0)
    }
}

/// Everything produced for one uploaded marksheet.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub processed_at: DateTime<Utc>,
    pub raw_texts: Vec<String>,
    pub confidences: Vec<f32>,
    /// Token corners in scan order, parallel to `raw_texts`.
    pub boxes: Vec<[Point; 4]>,
    pub table_source: TableSource,
    pub marks: MarksTable,
    pub subject_scores: SubjectScoreMap,
    pub recommendation: Recommendation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_from_json() {
        let json = r#"["Chemistry", {"text": "100", "bbox": [[0,0],[9,0],[9,5],[0,5]], "confidence": 1.7}]"#;
        let tokens = TokenBuffer::from_json_str(json).unwrap();
        assert_eq!(tokens.texts(), vec!["Chemistry", "100"]);
        assert_eq!(tokens.confidences(), vec![1.0, 1.0]);
        assert!(TokenBuffer::from_json_str(r#"{"text": "x"}"#).is_err());
    }

    #[test]
    fn test_csv_header_and_gaps() {
        let table = MarksTable::new(vec![
            MarksRecord::new("Physics", Some(100), None),
            MarksRecord::new("Urdu", None, Some(40)),
        ]);
        let csv = table.to_csv_string().unwrap();
        assert_eq!(csv, "Subject,Maximum,Obtained\nPhysics,100,\nUrdu,,40\n");
    }

    #[test]
    fn test_read_csv_accepts_decimal_marks() {
        let input = "Subject,Maximum,Obtained\nEnglish,100.0,85.0\nUrdu,75,\n";
        let table = MarksTable::read_csv(input.as_bytes()).unwrap();
        assert_eq!(
            table.records(),
            &[
                MarksRecord::new("English", Some(100), Some(85)),
                MarksRecord::new("Urdu", Some(75), None),
            ]
        );
    }

    #[test]
    fn test_read_csv_rejects_garbage_marks() {
        let input = "Subject,Maximum,Obtained\nEnglish,abc,85\n";
        assert!(MarksTable::read_csv(input.as_bytes()).is_err());
    }

    #[test]
    fn test_subject_score_map_ignores_unknown_ids() {
        let mut map = SubjectScoreMap::all_unknown(["math", "physics"]);
        map.set("math", Some(0.5));
        map.set("geography", Some(1.0));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("math"), Some(0.5));
        assert_eq!(map.get("physics"), None);
        assert!(!map.contains("geography"));
        assert_eq!(map.score_or_zero("geography"), 0.0);
    }

    #[test]
    fn test_personality_map_clamps() {
        let map: PersonalityMap = vec![("openness", 1.4), ("harm", -0.2), ("odd", f64::NAN)]
            .into_iter()
            .collect();
        assert_eq!(map.get("openness"), Some(1.0));
        assert_eq!(map.get("harm"), Some(0.0));
        assert_eq!(map.get("odd"), Some(0.0));
        assert_eq!(map.get_or_zero("missing"), 0.0);
    }

    #[test]
    fn test_field_parsing_and_order() {
        assert_eq!("arts".parse::<Field>().unwrap(), Field::Arts);
        assert!("MEDICINE".parse::<Field>().is_err());
        assert!(Field::Stem < Field::Arts && Field::Arts < Field::Commerce);
        assert_eq!(serde_json::to_string(&Field::Commerce).unwrap(), "\"COMMERCE\"");
    }

    #[test]
    fn test_parsed_table_tags() {
        let table = MarksTable::new(vec![MarksRecord::new("Math", Some(100), Some(90))]);
        assert_eq!(ParsedTable::Fallback(table.clone()).source(), TableSource::Fallback);
        assert_eq!(ParsedTable::Primary(table.clone()).into_table(), table);
        assert!(ParsedTable::Empty.records().is_empty());
    }
}
