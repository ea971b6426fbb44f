pub mod extractors;
pub mod image;
pub mod marks_table;
pub mod numeric;
pub mod ocr;

pub use extractors::SubjectScoreExtractor;
pub use image::ImageProcessor;
pub use marks_table::MarksTableBuilder;
pub use ocr::{default_recognizer, RecognizerConfig, TextRecognizer};
