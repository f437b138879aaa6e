use anyhow::{bail, Context, Result};
use csv::StringRecord;
use encoding_rs::Encoding;

use std::{fmt::Display, path::Path, str::FromStr};

use crate::{aggregate::Totals, brl::Brl, record::Record, stats::Describe};

/// Looks up a text encoding by its WHATWG label, such as `latin1` or
/// `utf-8`.
///
/// # Errors
///
/// Returns an error if `label` names no known encoding.
pub fn encoding_for(label: &str) -> Result<&'static Encoding> {
    let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
        bail!("unknown text encoding {label:?}");
    };
    Ok(encoding)
}

/// Holds the sales data read from one CSV file.
///
/// The table keeps the file's raw rows, for previewing, alongside the typed
/// [`Record`]s that every report is computed from. It is never modified once
/// read.
#[derive(Debug, Default)]
pub struct SalesTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    records: Vec<Record>,
}

impl SalesTable {
    /// Reads sales data from the `;`-delimited CSV file at `path`, decoding it
    /// with `encoding`.
    ///
    /// Dates that cannot be parsed are kept as missing values.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be read
    /// * A required column is missing
    /// * A quantity or amount cannot be parsed
    pub fn read_csv(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_bytes(&bytes, encoding).with_context(|| format!("{}", path.display()))
    }

    /// Parses sales data from the raw contents of a CSV file.
    ///
    /// # Errors
    ///
    /// As for [`Self::read_csv`].
    pub fn from_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<Self> {
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("input is not valid {}; bad bytes were replaced", used.name());
        }
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());
        let headers = rdr.headers()?.clone();
        let mut table = Self {
            headers,
            ..Self::default()
        };
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map_or(0, csv::Position::line);
            let record: Record = row
                .deserialize(Some(&table.headers))
                .with_context(|| format!("line {line}"))?;
            table.rows.push(row);
            table.records.push(record);
        }
        log::debug!(
            "read {} rows, {} columns ({} without a valid date)",
            table.len(),
            table.column_count(),
            table.undated()
        );
        Ok(table)
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if the source file has a column named `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Returns the number of columns in the source file.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns the number of records whose date could not be parsed.
    #[must_use]
    pub fn undated(&self) -> usize {
        self.records.iter().filter(|r| r.date.is_none()).count()
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals::of(&self.records)
    }

    /// Returns a printable preview of the first `n` rows, as read.
    #[must_use]
    pub fn head(&self, n: usize) -> Head<'_> {
        Head { table: self, n }
    }

    /// Returns the name, filled-cell count, and inferred type of each column
    /// in the source file.
    #[must_use]
    pub fn info(&self) -> Vec<ColumnInfo> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<&str> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .filter(|cell| !cell.trim().is_empty())
                    .collect();
                ColumnInfo {
                    name: name.to_string(),
                    non_null: cells.len(),
                    kind: ColumnKind::infer(&cells),
                }
            })
            .collect()
    }

    /// Returns descriptive statistics for every column whose cells are all
    /// numbers, in file order. Empty cells are skipped.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn describe(&self) -> Describe {
        let mut describe = Describe::new();
        for (i, column) in self.info().into_iter().enumerate() {
            let parse: fn(&str) -> Option<f64> = match column.kind {
                ColumnKind::Integer => |c| c.trim().parse::<i64>().ok().map(|n| n as f64),
                ColumnKind::Decimal => |c| Brl::from_str(c).ok().map(Brl::amount),
                ColumnKind::Text => continue,
            };
            let values: Vec<f64> = self
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .filter(|cell| !cell.trim().is_empty())
                .filter_map(parse)
                .collect();
            describe.add_column(&column.name, &values);
        }
        describe
    }
}

/// The type a column's cells parse as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Decimal,
    Text,
}

impl ColumnKind {
    fn infer(cells: &[&str]) -> Self {
        if cells.is_empty() {
            Self::Text
        } else if cells.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
            Self::Integer
        } else if cells.iter().all(|c| Brl::from_str(c).is_ok()) {
            Self::Decimal
        } else {
            Self::Text
        }
    }
}

impl Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Integer => "int64",
            Self::Decimal => "float64",
            Self::Text => "object",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub kind: ColumnKind,
}

/// The first rows of a [`SalesTable`], printed as aligned columns.
pub struct Head<'a> {
    table: &'a SalesTable,
    n: usize,
}

impl Display for Head<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows: Vec<&StringRecord> = self.table.rows.iter().take(self.n).collect();
        let widths: Vec<usize> = self
            .table
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain([h.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let index_width = rows.len().saturating_sub(1).to_string().len();
        write!(f, "{:index_width$}", "")?;
        for (h, width) in self.table.headers.iter().zip(widths.iter().copied()) {
            write!(f, "  {h:>width$}")?;
        }
        writeln!(f)?;
        for (i, row) in rows.iter().enumerate() {
            write!(f, "{i:index_width$}")?;
            for (cell, width) in row.iter().zip(widths.iter().copied()) {
                write!(f, "  {cell:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::{UTF_8, WINDOWS_1252};

    use super::*;

    fn latin1() -> &'static Encoding {
        encoding_for("latin1").unwrap()
    }

    #[test]
    fn read_csv_fn_correctly_parses_car_data() {
        let table = SalesTable::read_csv("testdata/vendas_carros.csv", latin1()).unwrap();
        assert_eq!(table.len(), 12);
        assert_eq!(table.column_count(), 8);
        assert_eq!(table.undated(), 1);
        let totals = table.totals();
        assert_eq!(totals.units, 17);
        assert!((totals.revenue.amount() - 1_871_200.0).abs() < 1e-6);
        let first = &table.records()[0];
        assert_eq!(first.item, "Onix");
        assert_eq!(first.location, "São Paulo Motors");
        assert_eq!(first.category, None);
        assert_eq!(first.unit_price, Brl::new(89_900.5));
    }

    #[test]
    fn read_csv_fn_correctly_parses_confectionery_data() {
        let table = SalesTable::read_csv("testdata/vendas_mondelez.csv", latin1()).unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(table.undated(), 0);
        assert_eq!(table.totals().units, 260);
        let first = &table.records()[0];
        assert_eq!(first.item, "Lacta Ao Leite 90g");
        assert_eq!(first.category.as_deref(), Some("Chocolates"));
        assert_eq!(first.location, "São Paulo");
    }

    #[test]
    fn read_csv_fn_returns_error_for_missing_file() {
        assert!(SalesTable::read_csv("testdata/bogus.csv", latin1()).is_err());
    }

    #[test]
    fn read_csv_fn_returns_error_for_missing_column() {
        let err = SalesTable::read_csv("testdata/sem_valor_total.csv", latin1()).unwrap_err();
        assert!(format!("{err:#}").contains("VALOR_TOTAL"), "{err:#}");
    }

    #[test]
    fn from_bytes_fn_returns_error_for_malformed_amount() {
        let data = b"DATA;MODELO;VENDEDOR;CONCESSIONARIA;QTD;VALOR_UNIT;VALOR_TOTAL\n\
                     01/01/2024;Onix;Ana;Centro;1;1.000,00;1.000,00\n";
        assert!(SalesTable::from_bytes(data, UTF_8).is_err());
    }

    #[test]
    fn from_bytes_fn_decodes_latin1_text() {
        let data = b"DATA;MODELO;VENDEDOR;CONCESSIONARIA;QTD;VALOR_UNIT;VALOR_TOTAL\n\
                     01/01/2024;Onix;Jo\xe3o;Bras\xedlia;1;10,5;10,5\n";
        let table = SalesTable::from_bytes(data, WINDOWS_1252).unwrap();
        assert_eq!(table.records()[0].seller, "João");
        assert_eq!(table.records()[0].location, "Brasília");
    }

    #[test]
    fn from_bytes_fn_keeps_rows_with_bad_dates() {
        let data = "DATA;MODELO;VENDEDOR;CONCESSIONARIA;QTD;VALOR_UNIT;VALOR_TOTAL\n\
                    not-a-date;Onix;Ana;Centro;2;10,0;20,0\n";
        let table = SalesTable::from_bytes(data.as_bytes(), UTF_8).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.undated(), 1);
        assert_eq!(table.totals().revenue, Brl::new(20.0));
    }

    #[test]
    fn describe_fn_includes_every_numeric_column() {
        let table = SalesTable::read_csv("testdata/vendas_carros.csv", latin1()).unwrap();
        let describe = table.describe();
        let id = describe.summary("ID").unwrap();
        assert_eq!(id.count, 12);
        assert_eq!(id.mean, 6.5);
        assert_eq!(describe.summary("QTD").unwrap().count, 12);
        assert_eq!(describe.summary("VALOR_UNIT").unwrap().max, 185_000.0);
        assert!(describe.summary("MODELO").is_none());
        assert!(describe.summary("DATA").is_none());
    }

    #[test]
    fn has_column_fn_checks_headers() {
        let table = SalesTable::read_csv("testdata/vendas_carros.csv", latin1()).unwrap();
        assert!(table.has_column("CONCESSIONARIA"));
        assert!(!table.has_column("CATEGORIA"));
    }

    #[test]
    fn encoding_for_fn_rejects_unknown_labels() {
        assert_eq!(encoding_for("latin1").unwrap(), WINDOWS_1252);
        assert_eq!(encoding_for("UTF-8").unwrap(), UTF_8);
        assert!(encoding_for("klingon").is_err());
    }

    #[test]
    fn info_fn_infers_column_types() {
        let table = SalesTable::read_csv("testdata/vendas_carros.csv", latin1()).unwrap();
        let info = table.info();
        assert_eq!(info.len(), 8);
        let kind_of = |name: &str| info.iter().find(|c| c.name == name).unwrap().kind;
        assert_eq!(kind_of("ID"), ColumnKind::Integer);
        assert_eq!(kind_of("QTD"), ColumnKind::Integer);
        assert_eq!(kind_of("VALOR_TOTAL"), ColumnKind::Decimal);
        assert_eq!(kind_of("MODELO"), ColumnKind::Text);
        assert!(info.iter().all(|c| c.non_null == 12));
    }

    #[test]
    fn head_fn_previews_requested_rows() {
        let table = SalesTable::read_csv("testdata/vendas_carros.csv", latin1()).unwrap();
        let text = table.head(5).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("MODELO"));
        assert!(lines[1].starts_with('0') && lines[1].contains("Onix"));
    }

    #[test]
    fn describe_fn_covers_numeric_columns() {
        let table = SalesTable::read_csv("testdata/vendas_mondelez.csv", latin1()).unwrap();
        let describe = table.describe();
        let qty = describe.summary("QTD").unwrap();
        assert_eq!(qty.count, 10);
        assert_eq!(qty.mean, 26.0);
        assert!(describe.summary("VALOR_UNIT").is_some());
        assert!(describe.summary("VALOR_TOTAL").is_some());
    }
}
