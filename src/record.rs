use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::brl::Brl;

/// Date layouts tried, in order, when parsing the `DATA` column.
///
/// Ambiguous dates are read day first: `01/02/2024` is the 1st of February.
/// Two-digit years go first: `%Y` would also accept `24` as the year 24.
const DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Defines the CSV format for sales data.
///
/// One record type covers both the car and the confectionery layouts: the
/// item column is `MODELO` or `DESCRICAO`, and the location column is
/// `CONCESSIONARIA` or `LOCAL`. Only the confectionery layout has a
/// `CATEGORIA` column. Any other columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "DATA", deserialize_with = "day_first")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "MODELO", alias = "DESCRICAO")]
    pub item: String,
    #[serde(rename = "CATEGORIA", default)]
    pub category: Option<String>,
    #[serde(rename = "VENDEDOR")]
    pub seller: String,
    #[serde(rename = "CONCESSIONARIA", alias = "LOCAL")]
    pub location: String,
    #[serde(rename = "QTD")]
    pub qty: i64,
    #[serde(rename = "VALOR_UNIT")]
    pub unit_price: Brl,
    #[serde(rename = "VALOR_TOTAL")]
    pub total: Brl,
}

impl Record {
    /// Returns the year of sale, if the date could be parsed.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Returns the month of sale (1 to 12), if the date could be parsed.
    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }

    /// Returns the English name of the month of sale, such as `December`.
    #[must_use]
    pub fn month_name(&self) -> Option<&'static str> {
        self.month().and_then(month_name)
    }
}

/// Returns the English name of month number `month` (1 to 12).
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok()?;
    Month::try_from(month).ok().map(|m| m.name())
}

/// Parses `s` as a day-first date, returning `None` if no known layout
/// matches.
///
/// # Examples
///
/// ```
/// # use vendas::record::parse_day_first;
/// let date = parse_day_first("31/12/2024").unwrap();
/// assert_eq!(date.to_string(), "2024-12-31");
/// assert_eq!(parse_day_first("not-a-date"), None);
/// ```
#[must_use]
pub fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn day_first<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_day_first(&raw))
}
