// -----------------------------------------------------------------------------
// Tabular export of fitted cell parameters
// -----------------------------------------------------------------------------

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::cell::{Cell, CellParam};
use crate::error::FitResult;

/// One cell: its name, every tunable parameter, and the image it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct CellRecord {
    pub name: String,
    pub values: Vec<(&'static str, f64)>,
    pub file: String,
}

/// Records sharing one column layout: `name`, the parameter labels, `file`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellRecordSet {
    param_columns: Vec<&'static str>,
    rows: Vec<CellRecord>,
}

impl CellRecordSet {
    pub fn from_cells<C: Cell>(cells: &[C], file: &str) -> Self {
        let param_columns = <C::Param as CellParam>::ALL.iter().map(|&p| p.label()).collect();
        let rows = cells
            .iter()
            .map(|cell| {
                let params = cell.params();
                CellRecord { name: params.name, values: params.values, file: file.to_string() }
            })
            .collect();
        Self { param_columns, rows }
    }

    pub fn rows(&self) -> &[CellRecord] {
        &self.rows
    }

    pub fn columns(&self) -> Vec<&'static str> {
        let mut cols = Vec::with_capacity(self.param_columns.len() + 2);
        cols.push("name");
        cols.extend(&self.param_columns);
        cols.push("file");
        cols
    }

    /// Appends another set's rows. Both sets must describe the same cell variant.
    pub fn extend(&mut self, other: CellRecordSet) {
        if self.param_columns.is_empty() {
            self.param_columns = other.param_columns;
        }
        self.rows.extend(other.rows);
    }

    /// Header line plus one line per row; fields are quoted when they contain
    /// a comma, a quote or a line break.
    pub fn to_csv(&self) -> String {
        let mut out = self.columns().join(",");
        out.push('\n');
        for row in &self.rows {
            let mut fields = Vec::with_capacity(row.values.len() + 2);
            fields.push(csv_escape(&row.name));
            fields.extend(row.values.iter().map(|(_, v)| v.to_string()));
            fields.push(csv_escape(&row.file));
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> FitResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl Serialize for CellRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 2))?;
        map.serialize_entry("name", &self.name)?;
        for (label, value) in &self.values {
            map.serialize_entry(label, value)?;
        }
        map.serialize_entry("file", &self.file)?;
        map.end()
    }
}

impl Serialize for CellRecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}
