//! CSV reading and writing.

use super::{Column, ColumnKind, Schema, Table};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, info};

/// Cell texts treated as missing.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Read a CSV file from disk. See [`read_csv`].
pub fn read_csv_path(path: impl AsRef<Path>, schema: &Schema) -> Result<Table> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading sessions");
    let file = std::fs::File::open(path)?;
    read_csv(file, schema)
}

/// Read a headed CSV into a [`Table`].
///
/// Every schema field must be present in the header, else
/// [`Error::InvalidSchema`]. Declared numeric columns must parse as `f64`.
/// Undeclared columns are numeric when every non-missing cell parses,
/// categorical otherwise.
pub fn read_csv<R: std::io::Read>(reader: R, schema: &Schema) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    schema.validate_headers(headers.iter().map(String::as_str))?;

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (cells, cell) in raw.iter_mut().zip(record.iter()) {
            cells.push(cell.to_string());
        }
    }

    let mut table = Table::new();
    for (name, cells) in headers.iter().zip(raw) {
        let kind = schema.kind_of(name).unwrap_or_else(|| infer_kind(&cells));
        let column = match kind {
            ColumnKind::Numeric => parse_numeric(name, &cells)?,
            ColumnKind::Categorical => {
                let labels: Vec<Option<&str>> = cells
                    .iter()
                    .map(|c| (!is_missing(c)).then_some(c.as_str()))
                    .collect();
                Column::categorical_from_labels(&labels)
            }
        };
        debug!(column = %name, %kind, "parsed column");
        table.push_column(name.clone(), column)?;
    }

    info!(rows = table.n_rows(), columns = table.n_cols(), "loaded table");
    Ok(table)
}

fn infer_kind(cells: &[String]) -> ColumnKind {
    let all_numeric = cells
        .iter()
        .filter(|c| !is_missing(c))
        .all(|c| c.parse::<f64>().is_ok());
    if all_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

fn parse_numeric(name: &str, cells: &[String]) -> Result<Column> {
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            if is_missing(cell) {
                return Ok(None);
            }
            cell.parse::<f64>().map(Some).map_err(|_| Error::Parse {
                row: row + 1,
                column: name.to_string(),
                value: cell.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Column::Numeric(values))
}

/// Write a [`Table`] as headed CSV. Missing cells are written empty.
pub fn write_csv<W: std::io::Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.names())?;
    for row in 0..table.n_rows() {
        let record: Vec<String> = table
            .iter()
            .map(|(_, col)| col.label(row).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Field;

    const SAMPLE: &str = "\
a,b,c,d
1,x,TRUE,5
,y,FALSE,NA
3.5,x,TRUE,7
";

    #[test]
    fn test_read_infers_and_handles_missing() {
        let table = read_csv(SAMPLE.as_bytes(), &Schema::infer()).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.numeric("a").unwrap(), &[Some(1.0), None, Some(3.5)]);
        assert_eq!(table.numeric("d").unwrap(), &[Some(5.0), None, Some(7.0)]);
        assert_eq!(table.require("b").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(table.require("c").unwrap().label(1).as_deref(), Some("FALSE"));
        assert_eq!(table.missing_count(), 2);
    }

    #[test]
    fn test_schema_forces_categorical() {
        let schema = Schema::new(vec![Field::categorical("d")]);
        let table = read_csv(SAMPLE.as_bytes(), &schema).unwrap();
        assert_eq!(table.require("d").unwrap().kind(), ColumnKind::Categorical);
    }

    #[test]
    fn test_missing_schema_column_is_fatal() {
        let schema = Schema::new(vec![Field::numeric("zz")]);
        let err = read_csv(SAMPLE.as_bytes(), &schema).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn test_unparsable_numeric_cell() {
        let schema = Schema::new(vec![Field::numeric("b")]);
        let err = read_csv(SAMPLE.as_bytes(), &schema).unwrap_err();
        match err {
            Error::Parse { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "b");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_then_read_preserves_cells() {
        let table = read_csv(SAMPLE.as_bytes(), &Schema::infer()).unwrap();
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("a,b,c,d\n1,x,TRUE,5\n,y,FALSE,\n"));
    }
}
