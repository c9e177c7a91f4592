#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while provisioning the database. All of them are fatal for the provisioner.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("failed to create database directory: {0}")]
    DatabaseDirCreation(std::io::Error),
    #[error("Error creating database: {0}")]
    DatabaseOpen(rusqlite::Error),
    #[error("Error creating tables: {0}")]
    TableCreation(rusqlite::Error),
    #[error("Error inserting data: {0}")]
    SeedInsert(rusqlite::Error),
    #[error("invalid sample value {value:?}: {source}")]
    SeedValue {
        value: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;

/// Errors from the text-generation service. Each one halts the current request.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,
    #[error("cannot reach generation service at {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("generation service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("failed to parse generation response: {0}")]
    ResponseParsing(String),
    #[error("generation response contained no text")]
    EmptyResponse,
}

/// Errors from executing a generated statement. These are reported, never raised.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Database connection failed: {0}")]
    Connection(rusqlite::Error),
    #[error("{0}")]
    Execution(rusqlite::Error),
    #[error("no SQL statement to execute")]
    NoStatement,
    #[error("expected a single SQL statement, found {0}")]
    MultipleStatements(usize),
}
