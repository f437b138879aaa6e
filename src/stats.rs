use std::fmt::Display;

/// Descriptive statistics for one numeric column.
///
/// `std` is the sample standard deviation (n - 1 denominator), and the
/// quartiles use linear interpolation between the closest ranks. Fields that
/// cannot be computed (`std` for fewer than two values, anything for an
/// empty column) are NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let n = count as f64;
        let mean = if count == 0 {
            f64::NAN
        } else {
            sorted.iter().sum::<f64>() / n
        };
        let std = if count < 2 {
            f64::NAN
        } else {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        };
        Self {
            count,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    fn rows(&self) -> [(&'static str, f64); 8] {
        #[allow(clippy::cast_precision_loss)]
        let count = self.count as f64;
        [
            ("count", count),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.q50),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// Returns the `q` quantile of the already sorted `sorted`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Summaries of several numeric columns, printed side by side.
#[derive(Debug, Default)]
pub struct Describe {
    columns: Vec<(String, Summary)>,
}

impl Describe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, name: &str, values: &[f64]) {
        self.columns.push((name.to_string(), Summary::of(values)));
    }

    #[must_use]
    pub fn summary(&self, name: &str) -> Option<&Summary> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl Display for Describe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .columns
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(14);
        write!(f, "{:6}", "")?;
        for (name, _) in &self.columns {
            write!(f, " {name:>width$}")?;
        }
        writeln!(f)?;
        for row in 0..8 {
            let mut label = "";
            let mut line = String::new();
            for (_, summary) in &self.columns {
                let (name, value) = summary.rows()[row];
                label = name;
                line.push_str(&format!(" {value:>width$.2}"));
            }
            writeln!(f, "{label:6}{line}")?;
        }
        Ok(())
    }
}
