use anyhow::Context;
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

/// Represents an amount of money in BRL (Brazilian reais).
///
/// Source files write amounts with a comma as the decimal separator
/// (`1234,50`), which [`FromStr`] accepts. The [`Display`] implementation
/// formats the amount as `R$ 1,234.50`: comma thousands separator, two
/// decimal places. Width and alignment flags are honoured.
#[derive(Clone, Copy, Default, DeserializeFromStr, PartialEq, PartialOrd)]
pub struct Brl(f64);

impl Brl {
    #[must_use]
    pub fn new(amount: f64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub fn amount(self) -> f64 {
        self.0
    }

    /// Returns the amount per unit for `qty` units.
    ///
    /// There is no guard for `qty == 0`: the result is then infinite, or NaN
    /// if the amount is also zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vendas::Brl;
    /// assert_eq!(Brl::new(150.0).per_unit(3), Brl::new(50.0));
    /// assert!(Brl::new(10.0).per_unit(0).amount().is_infinite());
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn per_unit(self, qty: i64) -> Self {
        Self(self.0 / qty as f64)
    }
}

impl Debug for Brl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Brl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.0.is_finite() {
            return f.pad(&format!("R$ {}", self.0));
        }
        let fixed = format!("{:.2}", self.0.abs());
        let (units, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let sign = if self.0.is_sign_negative() && self.0 != 0.0 {
            "-"
        } else {
            ""
        };
        f.pad(&format!("R$ {sign}{}.{cents}", group_thousands(units)))
    }
}

impl FromStr for Brl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let amount = s
            .trim()
            .replace(',', ".")
            .parse()
            .with_context(|| format!("invalid amount {s:?}"))?;
        Ok(Self(amount))
    }
}

impl Add for Brl {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Brl {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Brl {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Formats a whole number with a comma between each group of three digits.
///
/// ```
/// # use vendas::brl::thousands;
/// assert_eq!(thousands(1234567), "1,234,567");
/// assert_eq!(thousands(-980), "-980");
/// ```
#[must_use]
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let sign = if n < 0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
