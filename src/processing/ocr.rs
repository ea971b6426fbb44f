use crate::models::{TextToken, TokenBuffer};
use crate::utils::CareerError;
use image::GrayImage;
use log::debug;

/// Black-box text recognition: preprocessed pixels in, positioned tokens out.
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<TokenBuffer, CareerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    /// Directory holding `*.traineddata`; `None` lets the engine search its defaults.
    pub datapath: Option<String>,
    pub language: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig {
            datapath: None,
            language: "eng".to_string(),
        }
    }
}

/// The recognizer compiled into this build.
pub fn default_recognizer(config: RecognizerConfig) -> Result<Box<dyn TextRecognizer>, CareerError> {
    #[cfg(feature = "tesseract")]
    {
        Ok(Box::new(tesseract_engine::TesseractRecognizer::new(config)))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        let _ = config;
        Err(CareerError::Recognition(
            "no recognition engine available: rebuild with `--features tesseract`".to_string(),
        ))
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract_engine::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod tesseract_engine {
    use super::{parse_tesseract_tsv, RecognizerConfig, TextRecognizer};
    use crate::models::TokenBuffer;
    use crate::utils::CareerError;
    use image::GrayImage;
    use log::{info, warn};
    use std::sync::Mutex;
    use tesseract::Tesseract;

    /// Tesseract-backed recognizer. The engine is created on first use and
    /// reused for every later document.
    pub struct TesseractRecognizer {
        config: RecognizerConfig,
        engine: Mutex<Option<Tesseract>>,
    }

    impl TesseractRecognizer {
        pub fn new(config: RecognizerConfig) -> Self {
            TesseractRecognizer {
                config,
                engine: Mutex::new(None),
            }
        }

        fn init_engine(&self) -> Result<Tesseract, CareerError> {
            info!("Initializing Tesseract engine (language: {})", self.config.language);
            Tesseract::new(self.config.datapath.as_deref(), Some(self.config.language.as_str()))
                .map_err(|e| CareerError::Recognition(format!("Tesseract init error: {}", e)))
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &GrayImage) -> Result<TokenBuffer, CareerError> {
            let mut slot = self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let engine = match slot.take() {
                Some(engine) => engine,
                None => self.init_engine()?,
            };

            let (width, height) = image.dimensions();
            // The builder calls consume the engine; on failure the slot stays
            // empty and the next document starts from a fresh engine.
            let mut engine = engine
                .set_frame(image.as_raw(), width as i32, height as i32, 1, width as i32)
                .map_err(|e| {
                    warn!("Dropping Tesseract engine after set_frame failure");
                    CareerError::Recognition(format!("Tesseract set frame error: {}", e))
                })?
                .recognize()
                .map_err(|e| CareerError::Recognition(format!("Tesseract recognize error: {}", e)))?;

            let tsv = engine
                .get_tsv_text(0)
                .map_err(|e| CareerError::Recognition(format!("Tesseract TSV error: {}", e)))?;
            *slot = Some(engine);

            Ok(parse_tesseract_tsv(&tsv))
        }
    }
}

const WORD_LEVEL: u32 = 5;
const TSV_COLUMNS: usize = 12;

#[derive(Debug)]
struct TsvWord {
    line: (u32, u32, u32, u32),
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    confidence: f32,
    text: String,
}

impl TsvWord {
    fn parse(row: &str) -> Option<TsvWord> {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < TSV_COLUMNS || cols[0].trim().parse::<u32>().ok()? != WORD_LEVEL {
            return None;
        }
        let int = |i: usize| cols[i].trim().parse::<u32>().ok();
        let real = |i: usize| cols[i].trim().parse::<f32>().ok();

        let confidence = real(10)?;
        let text = cols[11..].join("\t").trim().to_string();
        if confidence < 0.0 || text.is_empty() {
            return None;
        }
        Some(TsvWord {
            line: (int(1)?, int(2)?, int(3)?, int(4)?),
            left: real(6)?,
            top: real(7)?,
            width: real(8)?,
            height: real(9)?,
            confidence: confidence / 100.0,
            text,
        })
    }

    fn has_digit(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_digit())
    }
}

/// Phrase under construction while walking the words of one line.
struct Phrase {
    words: Vec<String>,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    confidence: f32,
    line: (u32, u32, u32, u32),
    numeric: bool,
}

impl Phrase {
    fn start(word: TsvWord) -> Self {
        Phrase {
            left: word.left,
            top: word.top,
            right: word.left + word.width,
            bottom: word.top + word.height,
            confidence: word.confidence,
            line: word.line,
            numeric: word.has_digit(),
            words: vec![word.text],
        }
    }

    // Words join a phrase only when both sides are digit-free, on the same
    // line, and separated by no more than one line height.
    fn accepts(&self, word: &TsvWord) -> bool {
        let gap = word.left - self.right;
        let line_height = (self.bottom - self.top).max(word.height);
        !self.numeric && !word.has_digit() && self.line == word.line && gap <= line_height
    }

    fn push(&mut self, word: TsvWord) {
        self.left = self.left.min(word.left);
        self.top = self.top.min(word.top);
        self.right = self.right.max(word.left + word.width);
        self.bottom = self.bottom.max(word.top + word.height);
        self.confidence = self.confidence.min(word.confidence);
        self.words.push(word.text);
    }

    fn finish(self) -> TextToken {
        TextToken::from_rect(
            self.words.join(" "),
            self.left,
            self.top,
            self.right - self.left,
            self.bottom - self.top,
            self.confidence,
        )
    }
}

/// Turn Tesseract's TSV report into phrase-level tokens in scan order.
///
/// Tesseract reports single words, while the marks table heuristic expects a
/// label such as `MARKS OBTAINED` to arrive as one fragment, so adjacent
/// digit-free words on a line are merged. Numbers always stay separate.
pub fn parse_tesseract_tsv(tsv: &str) -> TokenBuffer {
    let mut tokens = Vec::new();
    let mut current: Option<Phrase> = None;

    for row in tsv.lines().filter(|l| !l.starts_with("level")) {
        let word = match TsvWord::parse(row) {
            Some(word) => word,
            None => continue,
        };
        match current.as_mut() {
            Some(phrase) if phrase.accepts(&word) => phrase.push(word),
            _ => {
                if let Some(done) = current.take() {
                    tokens.push(done.finish());
                }
                current = Some(Phrase::start(word));
            }
        }
    }
    if let Some(done) = current {
        tokens.push(done.finish());
    }

    debug!("Parsed {} tokens from Tesseract TSV", tokens.len());
    TokenBuffer::new(tokens)
}
