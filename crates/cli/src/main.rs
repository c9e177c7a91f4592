use clap::{Parser, Subcommand};
use medquery_core::{
    config::{api_key_from_env_value, database_path_from_env_value, generation_url_from_env_value},
    provision, Analysis, AnalysisService, CellValue, CoreConfig, Database, GeminiClient,
    GenerationConfig, TableView,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medquery")]
#[command(about = "Healthcare question explorer CLI")]
struct Cli {
    /// SQLite database file (defaults to MEDQUERY_DATABASE_PATH, then healthcare_db.sqlite3)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and tables, then insert the sample rows
    Provision {
        /// Create the schema only
        #[arg(long)]
        skip_seed: bool,
    },
    /// Translate a question into SQL, run it and print the result
    Ask {
        /// Natural-language question
        question: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medquery_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let database_path = cli
        .database
        .unwrap_or_else(|| database_path_from_env_value(std::env::var("MEDQUERY_DATABASE_PATH").ok()));
    let cfg = CoreConfig::new(
        database_path,
        GenerationConfig::new(
            api_key_from_env_value(std::env::var("GOOGLE_API_KEY").ok()),
            generation_url_from_env_value(std::env::var("MEDQUERY_GENERATION_URL").ok()),
        ),
    )?;

    match cli.command {
        Some(Commands::Provision { skip_seed }) => match provision(&cfg, !skip_seed) {
            Ok(Some(summary)) => println!(
                "Provisioned {} ({} sample rows inserted)",
                cfg.database_path().display(),
                summary.total()
            ),
            Ok(None) => println!("Provisioned {}", cfg.database_path().display()),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Ask { question }) => {
            let generator = Arc::new(GeminiClient::new(cfg.generation().clone()));
            let service = AnalysisService::new(Database::new(&cfg), generator);
            print_analysis(&service.analyse(&question));
        }
        None => {
            println!("Use 'medquery --help' for commands");
        }
    }

    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    if let Some(sql) = analysis.sql() {
        println!("Generated SQL Query\n{}\n", sql);
    }
    match analysis {
        Analysis::Warning { message } => eprintln!("Warning: {}", message),
        Analysis::GenerationFailed { message } => eprintln!("{}", message),
        Analysis::ExecutionFailed {
            message, notice, ..
        } => {
            eprintln!("{}", message);
            println!("{}", notice);
        }
        Analysis::Results { table, .. } => print_table(table),
        Analysis::NoResults { notice, .. } => println!("{}", notice),
    }
}

fn print_table(table: &TableView) {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(display_cell).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(&table.columns));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        println!("{}", line(row));
    }

    let numeric = table.numeric_columns();
    if !numeric.is_empty() {
        println!("\nNumeric columns: {}", numeric.join(", "));
    }
}

fn display_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => "None".to_string(),
        other => other.to_string(),
    }
}
