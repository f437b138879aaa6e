//! Text charts for the terminal.
//!
//! Each chart is a plain value with a [`Display`] implementation, so it can be
//! written to any [`std::fmt::Write`] or [`std::io::Write`] sink.

use std::fmt::Display;

use crate::brl::{thousands, Brl};

/// Width, in characters, of the longest bar.
const BAR_WIDTH: usize = 40;
/// Labels longer than this are cut short.
const MAX_LABEL: usize = 28;
/// Rows in the plotting area of a line chart.
const LINE_HEIGHT: usize = 10;
/// Characters per month on the x axis of a line chart.
const MONTH_WIDTH: usize = 5;
const MARKERS: [char; 6] = ['o', 'x', '+', '*', '#', '@'];

#[derive(Clone, Debug, PartialEq)]
pub enum Chart {
    Bar(BarChart),
    Line(LineChart),
    Pie(PieChart),
}

impl Chart {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Bar(c) => &c.title,
            Self::Line(c) => &c.title,
            Self::Pie(c) => &c.title,
        }
    }
}

impl Display for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bar(c) => Display::fmt(c, f),
            Self::Line(c) => Display::fmt(c, f),
            Self::Pie(c) => Display::fmt(c, f),
        }
    }
}

/// One bar per labelled value, drawn horizontally in the given order.
#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, Brl)>,
}

impl BarChart {
    #[must_use]
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            bars: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_bars<K: ToString>(mut self, bars: impl IntoIterator<Item = (K, Brl)>) -> Self {
        self.bars = bars.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self
    }
}

impl Display for BarChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_title(f, &self.title)?;
        let labels: Vec<String> = self.bars.iter().map(|(k, _)| shorten(k)).collect();
        let width = labels
            .iter()
            .map(|l| l.chars().count())
            .chain([self.x_label.chars().count()])
            .max()
            .unwrap_or(0);
        let max = scale_max(self.bars.iter().map(|(_, v)| *v));
        writeln!(f, "{:width$} │ {}", self.x_label, self.y_label)?;
        writeln!(f, "{:─<width$}─┼─{:─<BAR_WIDTH$}", "", "")?;
        for (label, (_, value)) in labels.iter().zip(&self.bars) {
            let bar = bar(*value, max, BAR_WIDTH);
            writeln!(f, "{label:width$} │{bar:<BAR_WIDTH$} {value}")?;
        }
        Ok(())
    }
}

/// A named sequence of monthly values, one marker per point.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    /// Month number (1 to 12) and value.
    pub points: Vec<(u32, Brl)>,
}

/// Values plotted by month, one marker style per series, with a legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl LineChart {
    fn grid(&self, max: f64) -> Vec<Vec<char>> {
        let mut grid = vec![vec![' '; MONTH_WIDTH * 12]; LINE_HEIGHT];
        for (series, marker) in self.series.iter().zip(MARKERS.iter().cycle()) {
            for &(month, value) in &series.points {
                if !(1..=12).contains(&month) {
                    continue;
                }
                let col = (month as usize - 1) * MONTH_WIDTH + MONTH_WIDTH / 2;
                let row = LINE_HEIGHT - 1 - level(value, max, LINE_HEIGHT - 1);
                grid[row][col] = *marker;
            }
        }
        grid
    }
}

impl Display for LineChart {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_title(f, &self.title)?;
        let max = scale_max(self.series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
        let ticks: Vec<String> = (0..LINE_HEIGHT)
            .map(|row| {
                let value = max * (LINE_HEIGHT - 1 - row) as f64 / (LINE_HEIGHT - 1) as f64;
                thousands(value.round() as i64)
            })
            .collect();
        let tick_width = ticks
            .iter()
            .map(String::len)
            .chain([self.y_label.chars().count()])
            .max()
            .unwrap_or(0);
        writeln!(f, "{:>tick_width$}", self.y_label)?;
        for (tick, row) in ticks.iter().zip(self.grid(max)) {
            let row: String = row.into_iter().collect();
            writeln!(f, "{tick:>tick_width$} ┤{}", row.trim_end())?;
        }
        writeln!(f, "{:tick_width$} └{:─<w$}", "", "", w = MONTH_WIDTH * 12)?;
        let months: String = (1..=12).map(|m| format!("{m:^MONTH_WIDTH$}")).collect();
        writeln!(f, "{:tick_width$}  {}", "", months.trim_end())?;
        writeln!(f, "{:tick_width$}  {:^w$}", "", self.x_label, w = MONTH_WIDTH * 12)?;
        let legend: Vec<String> = self
            .series
            .iter()
            .zip(MARKERS.iter().cycle())
            .map(|(s, m)| format!("{m} {}", s.name))
            .collect();
        writeln!(f, "{:tick_width$}  {}", "", legend.join("   "))?;
        Ok(())
    }
}

/// Shares of a whole, each labelled with its percentage to one decimal place.
#[derive(Clone, Debug, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<(String, Brl)>,
}

impl PieChart {
    /// Returns each slice's share of the whole, as a percentage.
    #[must_use]
    pub fn percentages(&self) -> Vec<f64> {
        let whole: f64 = self.slices.iter().map(|(_, v)| v.amount()).sum();
        self.slices
            .iter()
            .map(|(_, v)| v.amount() / whole * 100.0)
            .collect()
    }
}

impl Display for PieChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_title(f, &self.title)?;
        let labels: Vec<String> = self.slices.iter().map(|(k, _)| shorten(k)).collect();
        let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for (label, pct) in labels.iter().zip(self.percentages()) {
            let bar = bar(Brl::new(pct), 100.0, BAR_WIDTH);
            writeln!(f, "{label:width$} {pct:>5.1}% {bar}")?;
        }
        Ok(())
    }
}

fn write_title(f: &mut std::fmt::Formatter<'_>, title: &str) -> std::fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{:=<w$}", "", w = title.chars().count())
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(MAX_LABEL - 1).collect();
        short.push('…');
        short
    }
}

/// Returns the largest finite, positive value, or 1 if there is none.
fn scale_max(values: impl Iterator<Item = Brl>) -> f64 {
    values
        .map(Brl::amount)
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
        .unwrap_or(1.0)
}

/// Scales `value` to a whole number of steps out of `steps`, clamped so that
/// negative and non-finite values map to zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn level(value: Brl, max: f64, steps: usize) -> usize {
    let v = value.amount();
    if !v.is_finite() || v <= 0.0 {
        return 0;
    }
    ((v / max * steps as f64).round() as usize).min(steps)
}

fn bar(value: Brl, max: f64, width: usize) -> String {
    "█".repeat(level(value, max, width))
}
