//! Flat result tables.
//!
//! A `ResultTable` is what leaves the pipeline: one row per input feature,
//! geometry already dropped, columns = feature id, the feature's attribute
//! fields, and the reduced statistics. Row order follows the source feature
//! order.

use std::io::Write;

use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ResultTable {
    /// Ordered column names; `rows[i].len() == columns.len()`.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Write the table as CSV. Null cells become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);
        w.write_record(&self.columns)?;
        for row in &self.rows {
            let record: Vec<String> = row.iter().map(csv_field).collect();
            w.write_record(&record)?;
        }
        w.flush()?;
        Ok(())
    }
}

fn csv_field(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
