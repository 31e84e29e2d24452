use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Share of every donation that goes to the child's gift fund, in percent.
pub const GIFT_FUND_PERCENT: i64 = 10;

const MINOR_UNITS: i64 = 100;

/// Largest single amount the payment gateway will charge, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999;

/// A non-negative amount of money in minor units (cents).
///
/// Rendered on the wire as a decimal string with two fractional digits.
/// Accepted on input as a decimal string (`"50.00"`), a JSON integer
/// (whole currency units) or a JSON number with at most two fractional digits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoneyParseError {
    #[display(fmt = "amount is empty")]
    Empty,

    #[display(fmt = "amount is not a decimal number")]
    Malformed,

    #[display(fmt = "amount has more than two decimal places")]
    TooPrecise,

    #[display(fmt = "amount must not be negative")]
    Negative,

    #[display(fmt = "amount is too large")]
    Overflow,
}

impl std::error::Error for MoneyParseError {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Upper bound for a donation or a gift-fund target.
    pub const MAX: Money = Money(MAX_AMOUNT_CENTS);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Positive and no larger than [`Money::MAX`].
    pub fn is_chargeable(&self) -> bool {
        self.is_positive() && *self <= Money::MAX
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Splits a gross donation into its charity and gift-fund shares.
    ///
    /// The gift share is rounded down; whatever cent is left over belongs
    /// to the charity, so the shares always add up to `self`.
    pub fn allocate(&self) -> Allocation {
        let gift_fund = Money((i128::from(self.0) * i128::from(GIFT_FUND_PERCENT) / 100) as i64);
        let charity = Money(self.0 - gift_fund.0);
        Allocation { charity, gift_fund }
    }

    /// Whole percent of `target` that `self` represents, rounded down.
    pub fn percent_of(&self, target: Money) -> i64 {
        if target.0 <= 0 {
            return 0;
        }
        i64::try_from(i128::from(self.0) * 100 / i128::from(target.0)).unwrap_or(i64::MAX)
    }
}

/// Result of [`Money::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub charity: Money,
    pub gift_fund: Money,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MoneyParseError::Empty);
        }
        if s.starts_with('-') {
            return Err(MoneyParseError::Negative);
        }
        let s = s.strip_prefix('+').unwrap_or(s);
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyParseError::Malformed);
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyParseError::Malformed);
        }
        if frac.len() > 2 {
            return Err(MoneyParseError::TooPrecise);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyParseError::Overflow)?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyParseError::Malformed)? * 10,
            _ => frac.parse().map_err(|_| MoneyParseError::Malformed)?,
        };
        whole
            .checked_mul(MINOR_UNITS)
            .and_then(|cents| cents.checked_add(frac))
            .map(Money)
            .ok_or(MoneyParseError::Overflow)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> de::Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a money amount such as \"12.50\" or 12")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|units| units.checked_mul(MINOR_UNITS))
            .map(Money)
            .ok_or_else(|| E::custom(MoneyParseError::Overflow))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        if v < 0 {
            return Err(E::custom(MoneyParseError::Negative));
        }
        self.visit_u64(v as u64)
    }

    // Goes through the shortest decimal rendering of the number, so no
    // binary fraction ever reaches the arithmetic.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom(MoneyParseError::Malformed));
        }
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}
