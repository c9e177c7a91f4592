//! Question-to-results pipeline.
//!
//! One analysis walks `Idle -> AwaitingGeneration -> AwaitingExecution -> Idle`, stopping early
//! when generation fails. Generation failures end the request with an error and nothing is
//! executed. Execution failures are reported next to a "no results" notice; they never abort.
//!
//! Analyses are serialised: the stage lock is held for the whole run, so a second caller waits
//! until the first one has finished.

use crate::constants::NO_RESULTS_NOTICE;
use crate::database::{Database, Execution};
use crate::generation::SqlGenerator;
use crate::prompt::render_prompt;
use crate::results::{render_result_set, ResultView, TableView};
use crate::sanitize::sanitize;
use medquery_types::Question;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    AwaitingGeneration,
    AwaitingExecution,
}

/// What the user sees once an analysis has finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Analysis {
    /// The question was blank; nothing was sent anywhere.
    Warning { message: String },
    /// The model call failed; no SQL was executed.
    GenerationFailed { message: String },
    /// The generated statement failed to run.
    ExecutionFailed {
        sql: String,
        message: String,
        notice: String,
    },
    Results { sql: String, table: TableView },
    NoResults { sql: String, notice: String },
}

impl Analysis {
    /// The executed statement, when the request got that far.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Analysis::ExecutionFailed { sql, .. }
            | Analysis::Results { sql, .. }
            | Analysis::NoResults { sql, .. } => Some(sql),
            Analysis::Warning { .. } | Analysis::GenerationFailed { .. } => None,
        }
    }
}

pub struct AnalysisService {
    database: Database,
    generator: Arc<dyn SqlGenerator>,
    prompt: String,
    stage: Mutex<PipelineStage>,
}

impl AnalysisService {
    pub fn new(database: Database, generator: Arc<dyn SqlGenerator>) -> Self {
        Self {
            database,
            generator,
            prompt: render_prompt(),
            stage: Mutex::new(PipelineStage::Idle),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// True while another analysis holds the pipeline.
    pub fn is_busy(&self) -> bool {
        self.stage.try_lock().is_err()
    }

    /// Runs one question through generation, sanitising, execution and rendering.
    ///
    /// Blocks on the model and on the database; call it from a blocking context.
    pub fn analyse(&self, question: &str) -> Analysis {
        let question = match Question::new(question) {
            Ok(q) => q,
            Err(e) => {
                return Analysis::Warning {
                    message: e.to_string(),
                }
            }
        };

        let mut stage = self.stage.lock().unwrap_or_else(PoisonError::into_inner);
        let span = tracing::info_span!("analyse", question = %question);
        let _entered = span.enter();

        let analysis = self.run(&question, &mut stage);
        *stage = PipelineStage::Idle;
        analysis
    }

    fn run(&self, question: &Question, stage: &mut MutexGuard<'_, PipelineStage>) -> Analysis {
        **stage = PipelineStage::AwaitingGeneration;
        let raw = match self.generator.generate_sql(question, &self.prompt) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("AI Error: {}", e);
                return Analysis::GenerationFailed {
                    message: format!("AI Error: {e}"),
                };
            }
        };

        let sql = sanitize(&raw);
        tracing::info!("generated SQL: {}", sql);

        **stage = PipelineStage::AwaitingExecution;
        let execution = self.database.run_query(&sql);
        if let Execution::Failed(e) = &execution {
            return Analysis::ExecutionFailed {
                sql,
                message: format!("SQL Error: {e}"),
                notice: NO_RESULTS_NOTICE.to_string(),
            };
        }

        match render_result_set(execution.result_set()) {
            ResultView::Table(table) => Analysis::Results { sql, table },
            ResultView::NoResults { notice } => Analysis::NoResults { sql, notice },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::constants::DEFAULT_GENERATION_URL;
    use crate::generation::MockGenerator;
    use crate::provision::provision;
    use crate::CoreConfig;
    use tempfile::TempDir;

    fn service(generator: Arc<MockGenerator>) -> (AnalysisService, TempDir) {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            temp.path().join("healthcare_db.sqlite3"),
            GenerationConfig::new(None, DEFAULT_GENERATION_URL.into()),
        )
        .unwrap();
        provision(&cfg, true).unwrap();
        (AnalysisService::new(Database::new(&cfg), generator), temp)
    }

    #[test]
    fn blank_question_warns_without_calling_the_model() {
        let generator = Arc::new(MockGenerator::replying("SELECT 1"));
        let (svc, _temp) = service(generator.clone());

        let analysis = svc.analyse("   ");

        assert_eq!(
            analysis,
            Analysis::Warning {
                message: "Please enter a question".into()
            }
        );
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn generation_failure_skips_execution() {
        let generator = Arc::new(MockGenerator::failing("quota exceeded"));
        let (svc, _temp) = service(generator.clone());

        let analysis = svc.analyse("How many patients are there?");

        let Analysis::GenerationFailed { message } = &analysis else {
            panic!("expected generation failure, got {analysis:?}");
        };
        assert!(message.starts_with("AI Error:"));
        assert!(message.contains("quota exceeded"));
        assert!(analysis.sql().is_none());
        assert_eq!(generator.calls(), 1);
        assert!(!svc.is_busy());
    }

    #[test]
    fn bad_sql_is_reported_with_no_results_notice() {
        let generator = Arc::new(MockGenerator::replying(
            "Sure! Here is your query:\n```sql\nSELECT * FROM patients\n```",
        ));
        let (svc, _temp) = service(generator);

        let analysis = svc.analyse("Show every patient");

        let Analysis::ExecutionFailed { sql, message, notice } = &analysis else {
            panic!("expected execution failure, got {analysis:?}");
        };
        assert!(sql.starts_with("Sure! Here is your query:"));
        assert!(message.starts_with("SQL Error:"));
        assert_eq!(notice, "No results found for this query");
        assert_eq!(svc.database().open_connections(), 0);
    }

    #[test]
    fn explanation_after_the_block_is_an_execution_failure() {
        let generator = Arc::new(MockGenerator::replying(
            "```sql\nSELECT name FROM departments;\nThis query lists every department.\n```",
        ));
        let (svc, _temp) = service(generator);

        let analysis = svc.analyse("List all departments");

        let Analysis::ExecutionFailed { sql, message, .. } = &analysis else {
            panic!("expected execution failure, got {analysis:?}");
        };
        assert!(sql.ends_with("This query lists every department."));
        assert!(message.starts_with("SQL Error:"));
    }

    #[test]
    fn second_statement_is_never_executed() {
        let generator = Arc::new(MockGenerator::replying(
            "SELECT name FROM departments; DELETE FROM departments",
        ));
        let (svc, _temp) = service(generator);

        let analysis = svc.analyse("List all departments");

        let Analysis::ExecutionFailed { message, .. } = &analysis else {
            panic!("expected execution failure, got {analysis:?}");
        };
        assert_eq!(
            message,
            "SQL Error: expected a single SQL statement, found 2"
        );
        let remaining = svc.database().run_query("SELECT COUNT(*) FROM departments");
        assert_eq!(
            remaining.result_set().unwrap().rows,
            vec![vec![medquery_types::CellValue::Integer(3)]]
        );
    }

    #[test]
    fn non_select_statement_ends_in_no_results() {
        let generator = Arc::new(MockGenerator::replying(
            "UPDATE patients SET phone = '555-0101' WHERE patient_id = 2",
        ));
        let (svc, _temp) = service(generator);

        let analysis = svc.analyse("Set Bob's phone number");

        assert_eq!(
            analysis,
            Analysis::NoResults {
                sql: "UPDATE patients SET phone = '555-0101' WHERE patient_id = 2".into(),
                notice: "No results found for this query".into(),
            }
        );
    }

    #[test]
    fn successful_analysis_returns_to_idle() {
        let generator = Arc::new(MockGenerator::replying(
            "```sql\nSELECT l.test_name, l.result_value FROM lab_results l WHERE l.result_value > 200\n```",
        ));
        let (svc, _temp) = service(generator);

        let analysis = svc.analyse("List patients with cholesterol above 200 mg/dL");

        let Analysis::Results { table, .. } = &analysis else {
            panic!("expected results, got {analysis:?}");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.numeric_columns(), vec!["result_value"]);
        assert_eq!(*svc.stage.lock().unwrap(), PipelineStage::Idle);
    }
}
