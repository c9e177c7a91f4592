//! # MedQuery Core
//!
//! Core logic for the healthcare question explorer:
//! - provisioning the SQLite schema and its sample rows
//! - the fixed prompt and the text-generation client
//! - fence stripping, statement execution and result shaping
//! - the per-question analysis pipeline
//!
//! **No API concerns**: HTTP routing and page rendering belong in `api-rest`; process exit
//! codes belong in the CLI.

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod provision;
pub mod results;
pub mod sanitize;
pub mod schema;

pub use config::{CoreConfig, GenerationConfig};
pub use constants::{DEFAULT_DATABASE_PATH, SAMPLE_QUESTIONS};
pub use database::{Database, Execution, ResultSet};
pub use error::{ConfigError, GenerationError, ProvisionError, ProvisionResult, QueryError};
pub use generation::{GeminiClient, MockGenerator, SqlGenerator};
pub use pipeline::{Analysis, AnalysisService, PipelineStage};
pub use prompt::render_prompt;
pub use provision::{ensure_database, ensure_schema, provision, seed_sample_data, SeedSummary};
pub use results::{render_results, ChartSeries, ResultView, TableView};
pub use sanitize::sanitize;

pub use medquery_types::{CellValue, Question};
