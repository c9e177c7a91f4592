use std::collections::HashSet;
use std::sync::Arc;

use medquery_core::{
    provision, Analysis, AnalysisService, CellValue, CoreConfig, Database, GenerationConfig,
    MockGenerator,
};
use tempfile::TempDir;

fn seeded_config(temp: &TempDir) -> CoreConfig {
    let cfg = CoreConfig::new(
        temp.path().join("healthcare_db.sqlite3"),
        GenerationConfig::new(None, "http://127.0.0.1:1".into()),
    )
    .expect("valid config");
    provision(&cfg, true).expect("provision");
    cfg
}

#[test]
fn listing_departments_end_to_end() {
    let temp = TempDir::new().unwrap();
    let cfg = seeded_config(&temp);
    let generator = Arc::new(MockGenerator::replying(
        "```sql\nSELECT name FROM departments\n```",
    ));
    let service = AnalysisService::new(Database::new(&cfg), generator.clone());

    let analysis = service.analyse("List all departments");

    let Analysis::Results { sql, table } = analysis else {
        panic!("expected results");
    };
    assert_eq!(sql, "SELECT name FROM departments");
    assert_eq!(table.columns, vec!["name"]);
    assert_eq!(table.rows.len(), 3);

    let names: HashSet<String> = table
        .rows
        .into_iter()
        .map(|row| match &row[0] {
            CellValue::Text(name) => name.clone(),
            other => panic!("unexpected cell {other:?}"),
        })
        .collect();
    let expected: HashSet<String> = ["Cardiology", "Pediatrics", "Oncology"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(names, expected);
    assert!(table.charts.is_empty());
    assert_eq!(generator.calls(), 1);
}

#[test]
fn generation_error_never_touches_the_database() {
    let temp = TempDir::new().unwrap();
    let cfg = seeded_config(&temp);
    let service = AnalysisService::new(
        Database::new(&cfg),
        Arc::new(MockGenerator::failing("service unavailable")),
    );

    let analysis = service.analyse("List all departments");

    assert!(matches!(analysis, Analysis::GenerationFailed { .. }));
    assert!(analysis.sql().is_none());

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["state"], "generation_failed");
    assert!(json.get("table").is_none());
}

#[test]
fn requests_share_no_state_between_runs() {
    let temp = TempDir::new().unwrap();
    let cfg = seeded_config(&temp);
    let database = Database::new(&cfg);
    let service = AnalysisService::new(
        database.clone(),
        Arc::new(MockGenerator::replying(
            "SELECT first_name, last_name FROM patients WHERE insurance_id = 'INS-12345'",
        )),
    );

    for _ in 0..3 {
        let analysis = service.analyse("Who holds insurance INS-12345?");
        let Analysis::Results { table, .. } = analysis else {
            panic!("expected results");
        };
        assert_eq!(
            table.rows,
            vec![vec![
                CellValue::Text("Alice".into()),
                CellValue::Text("Johnson".into())
            ]]
        );
        assert_eq!(database.open_connections(), 0);
    }
}
