use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde_json::{Map, Number, Value};

use crate::models::{BatchItemResponse, InputRecord, PredictionResult, USER_ID_FIELD};

pub fn read_records(csv_path: &Path) -> anyhow::Result<Vec<InputRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut fields = Map::new();

        for (header, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            fields.insert(header.to_string(), cell_value(header, cell));
        }

        records.push(InputRecord::new(fields));
    }

    Ok(records)
}

fn cell_value(header: &str, cell: &str) -> Value {
    if header == USER_ID_FIELD {
        return Value::String(cell.to_string());
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

pub fn write_csv(out: &Path, results: &[PredictionResult]) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct CsvRow<'a> {
        user_id: String,
        gaya_belajar: &'a str,
        deskripsi: &'a str,
    }

    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;

    for result in results {
        let user_id = match &result.user_id {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        writer.serialize(CsvRow {
            user_id,
            gaya_belajar: &result.label,
            deskripsi: &result.description,
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_json_lines<W: Write>(mut out: W, results: &[PredictionResult]) -> anyhow::Result<()> {
    for result in results {
        serde_json::to_writer(&mut out, &BatchItemResponse::from(result))?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_rows_as_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learners.csv");
        std::fs::write(
            &path,
            "user_id,module_count,total_study_duration,avg_study_per_module,avg_completion_ratio,avg_submission_rating\n\
             101,5,120,24,0.9,4.5\n\
             102,3,,40,0.5,lumayan\n",
        )
        .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].user_id(), Some(&json!("101")));
        assert_eq!(records[0].get("module_count"), Some(&json!(5)));
        assert_eq!(records[0].get("avg_completion_ratio"), Some(&json!(0.9)));

        assert!(!records[1].contains("total_study_duration"));
        assert_eq!(records[1].get("avg_submission_rating"), Some(&json!("lumayan")));
    }

    #[test]
    fn writes_result_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let results = vec![
            PredictionResult {
                user_id: Some(json!("101")),
                label: "Reflective".to_string(),
                description: "tenang".to_string(),
                suggestions: vec![],
            },
            PredictionResult {
                user_id: None,
                label: "Consistent".to_string(),
                description: "rutin".to_string(),
                suggestions: vec![],
            },
        ];

        write_csv(&out, &results).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            written,
            "user_id,gaya_belajar,deskripsi\n101,Reflective,tenang\n,Consistent,rutin\n"
        );
    }

    #[test]
    fn json_lines_use_batch_shape() {
        let results = vec![PredictionResult {
            user_id: None,
            label: "Night Owl".to_string(),
            description: String::new(),
            suggestions: vec![],
        }];
        let mut buf = Vec::new();
        write_json_lines(&mut buf, &results).unwrap();
        let line: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            line,
            json!({"user_id": null, "gaya_belajar": "Night Owl", "deskripsi": "", "saran": []})
        );
    }
}
