use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Tabular data as a source hands it over: either raw rows of cells, or
/// records already keyed by column label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetData {
    Rows(Vec<Vec<String>>),
    Records(Vec<BTreeMap<String, String>>),
}

/// Body of a Sheets v4 `values.get` response. Only the cells are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect()
    }
}

/// Shape of a local JSON export: either an array of arrays or an array of
/// objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SheetExport {
    Rows(Vec<Vec<Value>>),
    Records(Vec<BTreeMap<String, Value>>),
}

impl From<SheetExport> for SheetData {
    fn from(export: SheetExport) -> Self {
        match export {
            SheetExport::Rows(rows) => SheetData::Rows(
                rows.into_iter()
                    .map(|row| row.iter().map(cell_to_string).collect())
                    .collect(),
            ),
            SheetExport::Records(records) => SheetData::Records(
                records
                    .into_iter()
                    .map(|record| {
                        record
                            .into_iter()
                            .map(|(k, v)| (k, cell_to_string(&v)))
                            .collect()
                    })
                    .collect(),
            ),
        }
    }
}

/// Spreadsheet cells arrive typed; the parser wants text. Booleans use the
/// sheet's own `TRUE`/`FALSE` spelling.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_range_into_rows() {
        let body = json!({
            "range": "Sheet1!A1:D3",
            "majorDimension": "ROWS",
            "values": [
                ["Task", "Due Date", "Priority", "Completed?"],
                ["Buy milk", "01/01/2024", "High", false],
                ["Call dentist"]
            ]
        });

        let range: ValueRange = serde_json::from_value(body).unwrap();
        assert_eq!(range.values.len(), 3);

        let rows = range.into_rows();
        assert_eq!(rows[1], vec!["Buy milk", "01/01/2024", "High", "FALSE"]);
        assert_eq!(rows[2], vec!["Call dentist"]);
    }

    #[test]
    fn test_empty_value_range() {
        let range: ValueRange = serde_json::from_value(json!({ "range": "Sheet1!A1:D1" })).unwrap();
        assert!(range.into_rows().is_empty());
    }

    #[test]
    fn test_export_records_shape() {
        let export: SheetExport = serde_json::from_value(json!([
            { "Task": "Buy milk", "Due Date": "2024-01-01", "Priority": "High", "Completed?": "FALSE" },
            { "Task": "Stretch", "Due Date": 45292, "Priority": null, "Completed?": true }
        ]))
        .unwrap();

        let SheetData::Records(records) = SheetData::from(export) else {
            panic!("expected records");
        };
        assert_eq!(records[1]["Due Date"], "45292");
        assert_eq!(records[1]["Priority"], "");
        assert_eq!(records[1]["Completed?"], "TRUE");
    }

    #[test]
    fn test_export_rows_shape() {
        let export: SheetExport =
            serde_json::from_value(json!([["Task", "Due Date"], ["Buy milk", "2024-01-01"]])).unwrap();
        assert_eq!(
            SheetData::from(export),
            SheetData::Rows(vec![
                vec!["Task".to_string(), "Due Date".to_string()],
                vec!["Buy milk".to_string(), "2024-01-01".to_string()],
            ])
        );
    }
}
