//! Shaping of query output for display.

use crate::constants::NO_RESULTS_NOTICE;
use crate::database::ResultSet;
use medquery_types::CellValue;
use serde::Serialize;

/// A chartable column: one point per row, `None` where the cell is NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub column: String,
    pub points: Vec<Option<f64>>,
}

/// Table ready for display, with the columns a user may chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Series for each numeric column, in column order. Empty when nothing is chartable.
    pub charts: Vec<ChartSeries>,
}

impl TableView {
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.charts.iter().map(|c| c.column.as_str()).collect()
    }

    pub fn series(&self, column: &str) -> Option<&ChartSeries> {
        self.charts.iter().find(|c| c.column == column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Table(TableView),
    NoResults { notice: String },
}

impl ResultView {
    fn no_results() -> Self {
        ResultView::NoResults {
            notice: NO_RESULTS_NOTICE.to_string(),
        }
    }
}

/// Builds the view for a result set.
///
/// Both columns and rows must be non-empty to get a table; anything else is an explicit
/// "no results" notice rather than an empty table.
pub fn render_results(columns: &[String], rows: &[Vec<CellValue>]) -> ResultView {
    if columns.is_empty() || rows.is_empty() {
        return ResultView::no_results();
    }

    let charts = (0..columns.len())
        .filter(|&i| is_numeric_column(rows, i))
        .map(|i| ChartSeries {
            column: columns[i].clone(),
            points: rows
                .iter()
                .map(|row| row.get(i).and_then(CellValue::as_f64))
                .collect(),
        })
        .collect();

    ResultView::Table(TableView {
        columns: columns.to_vec(),
        rows: rows.to_vec(),
        charts,
    })
}

/// Convenience for an optional result set, as produced by a statement run.
pub fn render_result_set(result: Option<&ResultSet>) -> ResultView {
    match result {
        Some(rs) => render_results(&rs.columns, &rs.rows),
        None => ResultView::no_results(),
    }
}

/// Numeric means at least one non-null cell, and every non-null cell an integer or real.
fn is_numeric_column(rows: &[Vec<CellValue>], index: usize) -> bool {
    let mut seen_number = false;
    for cell in rows.iter().filter_map(|row| row.get(index)) {
        match cell {
            CellValue::Null => {}
            CellValue::Integer(_) | CellValue::Real(_) => seen_number = true,
            _ => return false,
        }
    }
    seen_number
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn empty_rows_or_columns_give_notice() {
        assert_eq!(
            render_results(&cols(&["name"]), &[]),
            ResultView::NoResults {
                notice: "No results found for this query".into()
            }
        );
        assert!(matches!(
            render_results(&[], &[vec![CellValue::Integer(1)]]),
            ResultView::NoResults { .. }
        ));
        assert!(matches!(render_result_set(None), ResultView::NoResults { .. }));
    }

    #[test]
    fn numeric_columns_are_detected_and_charted() {
        let columns = cols(&["test_name", "result_value", "lab_id"]);
        let rows = vec![
            vec![
                CellValue::Text("Cholesterol Level".into()),
                CellValue::Real(210.5),
                CellValue::Integer(1),
            ],
            vec![
                CellValue::Text("Peak Flow Rate".into()),
                CellValue::Real(350.0),
                CellValue::Integer(2),
            ],
        ];

        let ResultView::Table(table) = render_results(&columns, &rows) else {
            panic!("expected a table");
        };
        assert_eq!(table.numeric_columns(), vec!["result_value", "lab_id"]);
        assert_eq!(
            table.series("result_value").unwrap().points,
            vec![Some(210.5), Some(350.0)]
        );
        assert!(table.series("test_name").is_none());
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn nulls_do_not_disqualify_a_numeric_column() {
        let columns = cols(&["value"]);
        let rows = vec![vec![CellValue::Null], vec![CellValue::Integer(7)]];

        let ResultView::Table(table) = render_results(&columns, &rows) else {
            panic!("expected a table");
        };
        assert_eq!(table.series("value").unwrap().points, vec![None, Some(7.0)]);
    }

    #[test]
    fn all_null_or_mixed_columns_are_not_numeric() {
        let columns = cols(&["empty", "mixed"]);
        let rows = vec![
            vec![CellValue::Null, CellValue::Integer(1)],
            vec![CellValue::Null, CellValue::Text("n/a".into())],
        ];

        let ResultView::Table(table) = render_results(&columns, &rows) else {
            panic!("expected a table");
        };
        assert!(table.numeric_columns().is_empty());
    }

    #[test]
    fn view_serialises_with_kind_tag() {
        let view = render_results(&cols(&["n"]), &[vec![CellValue::Integer(3)]]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "table");
        assert_eq!(json["rows"], serde_json::json!([[3]]));
        assert_eq!(json["charts"][0]["column"], "n");
    }
}
