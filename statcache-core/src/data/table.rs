//! Opaque tabular result and its CSV form.
//!
//! Cells are kept as text: the cache stores whatever the source scraped and
//! never interprets it.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A table of string cells with named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices; handy for sources and tests.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom. Short rows yield `""`.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Read CSV with a header row.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Write CSV with a header row.
    ///
    /// CSV cannot tell a record with no fields from one empty field, so a
    /// zero-length row reads back as `[""]`. A table without columns writes
    /// nothing and reads back as the empty table.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        if !self.columns.is_empty() {
            wtr.write_record(&self.columns)?;
            for row in &self.rows {
                wtr.write_record(row)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["Name", "Team", "K%"],
            &[
                &["Gerrit Cole", "NYY", "27.0%"],
                &["Smith, Jr.", "BOS", "22.1%"],
            ],
        )
    }

    #[test]
    fn csv_preserves_quoted_cells() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Name,Team,K%\n"));
        assert!(text.contains("\"Smith, Jr.\""));

        let back = Table::read_csv(buf.as_slice()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn header_only_table_reads_as_empty() {
        let back = Table::read_csv("Name,Team\n".as_bytes()).unwrap();
        assert_eq!(back.columns, vec!["Name", "Team"]);
        assert!(back.is_empty());
    }

    #[test]
    fn degenerate_shapes_read_back_normalized() {
        let ragged = Table {
            columns: vec!["Name".into(), "G".into()],
            rows: vec![vec![], vec!["1".into()]],
        };
        let mut buf = Vec::new();
        ragged.write_csv(&mut buf).unwrap();
        let back = Table::read_csv(buf.as_slice()).unwrap();
        assert_eq!(back.rows, vec![vec![String::new()], vec!["1".to_string()]]);
        assert_eq!(back.len(), ragged.len());

        let headless = Table {
            columns: Vec::new(),
            rows: vec![vec!["x".into()]],
        };
        let mut buf = Vec::new();
        headless.write_csv(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(Table::read_csv(buf.as_slice()).unwrap(), Table::default());
    }

    #[test]
    fn column_lookup() {
        let t = sample();
        assert_eq!(t.column("Team"), Some(vec!["NYY", "BOS"]));
        assert_eq!(t.column("ERA"), None);
        assert_eq!(t.len(), 2);
    }
}
