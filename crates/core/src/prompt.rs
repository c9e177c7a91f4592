//! The fixed instruction sent with every question.

use crate::schema::TABLES;

const PREAMBLE: &str = "You are a healthcare SQL expert. The database is SQLite. Database schema:";

const RULES: [&str; 5] = [
    "Use explicit JOIN syntax",
    "Format dates using strftime()",
    "Always qualify column names with table aliases",
    "Include relevant WHERE clauses",
    "Handle NULL values appropriately",
];

/// Returns the system instruction: the full schema followed by the formatting rules.
///
/// The text does not depend on the question, which travels as a separate part of the
/// generation request. Every call returns the same string.
pub fn render_prompt() -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push('\n');
    for table in TABLES {
        prompt.push_str(&format!(
            "{} ({})\n",
            table.name.to_uppercase(),
            table.columns.join(", ")
        ));
    }
    prompt.push_str("\nRules:\n");
    for (i, rule) in RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }
    prompt
}
