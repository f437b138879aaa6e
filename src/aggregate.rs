use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
};

use crate::{brl::Brl, record::Record};

/// A categorical column that sales can be grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Car model or product description.
    Item,
    /// Product category. Records without one are left out of the grouping.
    Category,
    Seller,
    /// Car dealer or city.
    Location,
}

impl Dimension {
    fn key(self, record: &Record) -> Option<&str> {
        match self {
            Self::Item => Some(&record.item),
            Self::Category => record.category.as_deref(),
            Self::Seller => Some(&record.seller),
            Self::Location => Some(&record.location),
        }
    }
}

/// Revenue and units sold over a set of records.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub revenue: Brl,
    pub units: i64,
}

impl Totals {
    #[must_use]
    pub fn of<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut totals = Self::default();
        for rec in records {
            totals.add(rec);
        }
        totals
    }

    fn add(&mut self, rec: &Record) {
        self.revenue += rec.total;
        self.units += rec.qty;
    }

    /// Returns the average ticket: revenue divided by units.
    ///
    /// Not guarded against zero units; see [`Brl::per_unit`].
    #[must_use]
    pub fn ticket(&self) -> Brl {
        self.revenue.per_unit(self.units)
    }
}

/// Groups sold under one key, in descending order of value.
///
/// Groups with equal values are ordered by ascending key, so the order never
/// depends on the order of rows in the input file.
#[derive(Clone, Default, PartialEq)]
pub struct Ranking(Vec<(String, Brl)>);

impl Ranking {
    fn from_groups(groups: impl IntoIterator<Item = (String, Brl)>) -> Self {
        let mut rows: Vec<_> = groups.into_iter().collect();
        rows.sort_by(|(key_a, a), (key_b, b)| {
            b.amount()
                .total_cmp(&a.amount())
                .then_with(|| key_a.cmp(key_b))
        });
        Self(rows)
    }

    /// Keeps only the first `n` groups.
    #[must_use]
    pub fn top(mut self, n: usize) -> Self {
        self.0.truncate(n);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Brl)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Brl> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Returns the sum of every group's value.
    #[must_use]
    pub fn total(&self) -> Brl {
        self.0.iter().map(|(_, v)| *v).sum()
    }
}

impl Debug for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in self.iter() {
            writeln!(f, "{key:width$} {value:>18}")?;
        }
        Ok(())
    }
}

/// Returns total revenue for each key of `dim`, in ascending key order.
#[must_use]
pub fn revenue_by(records: &[Record], dim: Dimension) -> BTreeMap<String, Brl> {
    let mut groups: BTreeMap<String, Brl> = BTreeMap::new();
    for rec in records {
        if let Some(key) = dim.key(rec) {
            *groups.entry(key.to_string()).or_default() += rec.total;
        }
    }
    groups
}

/// Returns total revenue for each key of `dim`, highest first.
#[must_use]
pub fn ranked_revenue(records: &[Record], dim: Dimension) -> Ranking {
    Ranking::from_groups(revenue_by(records, dim))
}

/// Returns the average ticket for each key of `dim`, highest first.
///
/// The ticket of a group is its revenue divided by its units sold. A group
/// whose units sum to zero gets an infinite (or NaN) ticket.
#[must_use]
pub fn ranked_ticket(records: &[Record], dim: Dimension) -> Ranking {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for rec in records {
        if let Some(key) = dim.key(rec) {
            groups.entry(key).or_default().add(rec);
        }
    }
    Ranking::from_groups(
        groups
            .into_iter()
            .map(|(key, totals)| (key.to_string(), totals.ticket())),
    )
}

/// Returns total revenue per year, in chronological order.
///
/// Records without a valid date are left out.
#[must_use]
pub fn revenue_by_year(records: &[Record]) -> BTreeMap<i32, Brl> {
    let mut years: BTreeMap<i32, Brl> = BTreeMap::new();
    for rec in records {
        if let Some(year) = rec.year() {
            *years.entry(year).or_default() += rec.total;
        }
    }
    years
}

/// Returns total revenue per month (1 to 12) for each year, in chronological
/// order. Months without sales are absent.
///
/// Records without a valid date are left out.
#[must_use]
pub fn revenue_by_month(records: &[Record]) -> BTreeMap<i32, BTreeMap<u32, Brl>> {
    let mut years: BTreeMap<i32, BTreeMap<u32, Brl>> = BTreeMap::new();
    for rec in records {
        if let (Some(year), Some(month)) = (rec.year(), rec.month()) {
            *years.entry(year).or_default().entry(month).or_default() += rec.total;
        }
    }
    years
}
