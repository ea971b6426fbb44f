//! careermate - marksheet scanning and field recommendation
//!
//! Usage:
//!   careermate scan <IMAGE>        Full pipeline on a scanned marksheet
//!   careermate parse <TOKENS>      Rebuild a marks table from recognized tokens
//!   careermate recommend           Recommend a field from a marks CSV and traits
//!   careermate survey              Aggregate questionnaire answers

use careermate::models::{Catalog, MarksTable, PersonalityMap, TableSource, TokenBuffer};
use careermate::processing::ocr::parse_tesseract_tsv;
use careermate::processing::{default_recognizer, MarksTableBuilder, RecognizerConfig};
use careermate::scoring::PersonalityNormalizer;
use careermate::survey::{load_answers, RiasecBank, SurveyAggregate, TciBank};
use careermate::{CareerError, CareerRecommender};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "careermate", version)]
#[command(about = "Recommend an academic field from a scanned marksheet and personality traits")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a marksheet image and print the full report as JSON
    Scan {
        /// Scanned marksheet (PNG, JPEG, ...)
        image: PathBuf,

        /// JSON object of personality traits (0-5 or 0-100 scale)
        #[arg(long)]
        personality: Option<PathBuf>,

        /// Also write the recovered marks table to this CSV file
        #[arg(long)]
        marks_csv: Option<PathBuf>,

        /// Subject vocabulary and subfield catalog (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Directory containing Tesseract traineddata files
        #[arg(long, env = "TESSDATA_PREFIX")]
        tessdata: Option<String>,

        /// Recognition language
        #[arg(long, env = "CAREERMATE_OCR_LANG", default_value = "eng")]
        lang: String,
    },

    /// Rebuild a marks table from recognized tokens
    Parse {
        /// JSON array of tokens or strings, or Tesseract TSV with --tsv
        tokens: PathBuf,

        /// Input is Tesseract TSV output
        #[arg(long)]
        tsv: bool,

        /// Write the table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Recommend a field from a marks CSV and personality inputs
    Recommend {
        /// Marks table CSV (Subject,Maximum,Obtained); placeholder table if absent
        #[arg(long)]
        marks: Option<PathBuf>,

        /// JSON object of personality traits (0-5 or 0-100 scale)
        #[arg(long)]
        personality: Option<PathBuf>,

        #[command(flatten)]
        survey: SurveyArgs,

        /// Subject vocabulary and subfield catalog (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Aggregate RIASEC and TCI questionnaire answers
    Survey {
        #[command(flatten)]
        survey: SurveyArgs,
    },
}

#[derive(Args)]
struct SurveyArgs {
    /// RIASEC question bank CSV (question, category, id)
    #[arg(long, requires = "riasec_answers")]
    riasec_questions: Option<PathBuf>,

    /// RIASEC answers JSON keyed by question id
    #[arg(long, requires = "riasec_questions")]
    riasec_answers: Option<PathBuf>,

    /// TCI question bank CSV (question, trait)
    #[arg(long, requires = "tci_answers")]
    tci_questions: Option<PathBuf>,

    /// TCI answers JSON keyed by question id
    #[arg(long, requires = "tci_questions")]
    tci_answers: Option<PathBuf>,
}

impl SurveyArgs {
    fn is_empty(&self) -> bool {
        self.riasec_questions.is_none() && self.tci_questions.is_none()
    }

    fn aggregate(&self) -> Result<SurveyAggregate, CareerError> {
        let mut aggregate = SurveyAggregate::default();
        if let (Some(questions), Some(answers)) = (&self.riasec_questions, &self.riasec_answers) {
            aggregate.riasec = RiasecBank::from_path(questions)?.aggregate(&load_answers(answers)?);
        }
        if let (Some(questions), Some(answers)) = (&self.tci_questions, &self.tci_answers) {
            aggregate.tci = TciBank::from_path(questions)?.aggregate(&load_answers(answers)?);
        }
        Ok(aggregate)
    }
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    source: TableSource,
    records: &'a MarksTable,
}

#[derive(Serialize)]
struct SurveyOutput<'a> {
    aggregate: &'a SurveyAggregate,
    personality: PersonalityMap,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error ({}): {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CareerError> {
    match command {
        Commands::Scan {
            image,
            personality,
            marks_csv,
            catalog,
            tessdata,
            lang,
        } => {
            let recommender = CareerRecommender::new(load_catalog(catalog.as_deref())?);
            let traits = load_personality(personality.as_deref())?;
            let recognizer = default_recognizer(RecognizerConfig {
                datapath: tessdata,
                language: lang,
            })?;

            let bytes = std::fs::read(&image).map_err(|e| CareerError::io(&image, e))?;
            let report = recommender.scan_document(&*recognizer, &bytes, &traits)?;

            if let Some(path) = marks_csv {
                write_marks(&report.marks, &path)?;
            }
            print_json(&report)
        }
        Commands::Parse { tokens, tsv, csv } => {
            let input = std::fs::read_to_string(&tokens).map_err(|e| CareerError::io(&tokens, e))?;
            let buffer = if tsv {
                parse_tesseract_tsv(&input)
            } else {
                TokenBuffer::from_json_str(&input)?
            };

            let parsed = MarksTableBuilder::build(&buffer);
            let source = parsed.source();
            let table = parsed.into_table();
            if let Some(path) = csv {
                write_marks(&table, &path)?;
            }
            print_json(&ParseOutput {
                source,
                records: &table,
            })
        }
        Commands::Recommend {
            marks,
            personality,
            survey,
            catalog,
        } => {
            let recommender = CareerRecommender::new(load_catalog(catalog.as_deref())?);

            // Explicit trait values override questionnaire aggregates.
            let mut traits = survey.aggregate()?.personality_map();
            traits.merge(&load_personality(personality.as_deref())?);

            let recommendation = match marks {
                Some(path) => {
                    let file = File::open(&path).map_err(|e| CareerError::io(&path, e))?;
                    recommender.recommend(&MarksTable::read_csv(file)?, &traits)
                }
                None => recommender.quick_recommendation(&traits),
            };
            print_json(&recommendation)
        }
        Commands::Survey { survey } => {
            if survey.is_empty() {
                return Err(CareerError::Survey(
                    "provide --riasec-questions/--riasec-answers and/or --tci-questions/--tci-answers"
                        .to_string(),
                ));
            }
            let aggregate = survey.aggregate()?;
            print_json(&SurveyOutput {
                personality: aggregate.personality_map(),
                aggregate: &aggregate,
            })
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog, CareerError> {
    match path {
        Some(path) => Catalog::from_json_file(path),
        None => Ok(Catalog::default()),
    }
}

fn load_personality(path: Option<&Path>) -> Result<PersonalityMap, CareerError> {
    let path = match path {
        Some(path) => path,
        None => return Ok(PersonalityMap::new()),
    };
    let json = std::fs::read_to_string(path).map_err(|e| CareerError::io(path, e))?;
    let raw: BTreeMap<String, Value> = serde_json::from_str(&json)?;
    info!("Loaded {} personality traits from {}", raw.len(), path.display());
    Ok(PersonalityNormalizer::normalize(&raw))
}

fn write_marks(table: &MarksTable, path: &Path) -> Result<(), CareerError> {
    let file = File::create(path).map_err(|e| CareerError::io(path, e))?;
    table.write_csv(file)?;
    info!("Wrote {} marks rows to {}", table.len(), path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CareerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
