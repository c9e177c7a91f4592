//! Constants used throughout the MedQuery core crate.

/// Default SQLite file holding the healthcare dataset when no path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "healthcare_db.sqlite3";

/// Hosted model used to translate questions into SQL.
pub const GENERATION_MODEL: &str = "gemini-1.5-flash-latest";

/// Base URL of the hosted generation API.
pub const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the generation API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Notice shown when a query yields no table to display.
pub const NO_RESULTS_NOTICE: &str = "No results found for this query";

/// Example questions listed next to the question box.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "List patients with cholesterol above 200 mg/dL",
    "Show average lab results by test type",
    "Find doctors with most appointments this month",
    "Patients with multiple prescriptions in March 2024",
    "Upcoming appointments for cardiology department",
];
