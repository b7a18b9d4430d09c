//! # Unit Types
//!
//! Type-safe wrappers for the quantities an estimate deals in. Every value is
//! a [`Decimal`], never a binary float: quantities like `0.1` or `0.15` must
//! multiply and round exactly the way an accountant would.
//!
//! - [`Money`] - currency amount, always carried at 2 decimal places once rounded
//! - [`UnitPrice`] - currency per unit of measure (catalog price)
//! - [`Quantity`] - non-negative measured quantity from a takeoff
//! - [`Rate`] - markup fraction (0.15 = 15%)
//! - [`MeasurementUnit`] / [`MeasureKind`] - what a quantity measures
//!
//! ## Rounding
//!
//! All rounding is half-up to cents ([`RoundingStrategy::MidpointAwayFromZero`];
//! every rounded amount here is non-negative, where the two are identical).
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::units::{Quantity, UnitPrice};
//!
//! let qty = Quantity::parse("100").unwrap();
//! let price = UnitPrice::parse("1.85").unwrap();
//! assert_eq!(qty.extend(price).to_string(), "185.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places carried by [`Money`]
pub const CURRENCY_SCALE: u32 = 2;

/// Largest quantity accepted on a line, whether read from a takeoff or
/// summed by aggregation.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0); // 1e12

/// Largest unit price accepted in a catalog.
///
/// `MAX_QUANTITY * MAX_UNIT_PRICE` is 1e21, so extending a valid line can
/// never leave `Decimal`'s range (about 7.9e28).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(0x3B9A_CA00, 0, 0, false, 0); // 1e9

/// Largest markup rate accepted (1000%).
pub const MAX_RATE: Decimal = Decimal::TEN;

/// Round half-up to cents and pin the scale so "185" prints as "185.00".
fn round_to_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

/// Parse a decimal the way spreadsheet exports write them: plain
/// (`"12.5"`) or scientific (`"1.25e1"`), surrounding whitespace ignored.
fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("value is empty".to_string());
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| format!("'{}' is not a decimal number", trimmed))
}

// ============================================================================
// Money
// ============================================================================

/// Currency amount.
///
/// Serializes as an exact JSON number (`185.00`), not a string and not a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::arbitrary_precision")] pub Decimal);

impl Money {
    /// Zero dollars, at currency scale
    pub fn zero() -> Self {
        Money(Decimal::new(0, CURRENCY_SCALE))
    }

    /// Create from an integer number of cents
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Round an arbitrary decimal amount half-up to cents
    pub fn rounded(value: Decimal) -> Self {
        Money(round_to_cents(value))
    }

    /// `round(self * rate, 2)`, half-up. `None` on overflow.
    pub fn apply_rate(self, rate: Rate) -> Option<Money> {
        self.0.checked_mul(rate.0).map(Money::rounded)
    }

    /// `self + rhs`, `None` on overflow
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Get the raw decimal value
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Format with a currency symbol and thousands separators: `$1,250.00`
    pub fn to_currency_string(self, symbol: &str) -> String {
        let plain = round_to_cents(self.0.abs()).to_string();
        let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() { "-" } else { "" };
        format!("{}{}{}.{}", sign, symbol, grouped, cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", round_to_cents(self.0))
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ============================================================================
// Unit Price
// ============================================================================

/// Price per unit of measure (e.g. $/LF, $/SF).
///
/// Not rounded: catalog prices may carry more than two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPrice(#[serde(with = "rust_decimal::serde::arbitrary_precision")] pub Decimal);

impl UnitPrice {
    /// Create from an integer number of cents
    pub fn from_cents(cents: i64) -> Self {
        UnitPrice(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Parse a price, rejecting negative values
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value = parse_decimal(raw)?;
        UnitPrice::try_new(value)
    }

    /// Validate a decimal price
    pub fn try_new(value: Decimal) -> Result<Self, String> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(format!("unit price {} is negative", value));
        }
        if value > MAX_UNIT_PRICE {
            return Err(format!("unit price {} exceeds {}", value, MAX_UNIT_PRICE));
        }
        Ok(UnitPrice(value))
    }

    /// Get the raw decimal value
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show at least cents so 8.5 reads as 8.50
        let mut shown = self.0.normalize();
        if shown.scale() < CURRENCY_SCALE {
            shown.rescale(CURRENCY_SCALE);
        }
        write!(f, "{}", shown)
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// Non-negative measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "rust_decimal::serde::arbitrary_precision")] pub Decimal);

impl Quantity {
    /// Zero quantity
    pub fn zero() -> Self {
        Quantity(Decimal::ZERO)
    }

    /// Parse a takeoff quantity.
    ///
    /// Fails on empty, non-numeric, negative, or absurdly large input.
    pub fn parse(raw: &str) -> Result<Self, String> {
        Quantity::try_new(parse_decimal(raw)?)
    }

    /// Validate a decimal quantity
    pub fn try_new(value: Decimal) -> Result<Self, String> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(format!("quantity {} is negative", value));
        }
        if value > MAX_QUANTITY {
            return Err(format!("quantity {} exceeds {}", value, MAX_QUANTITY));
        }
        Ok(Quantity(value))
    }

    /// Create from a whole count (doors, windows, fixtures)
    pub fn from_count(count: usize) -> Self {
        Quantity(Decimal::from(count as u64))
    }

    /// `round(self * price, 2)`, half-up.
    ///
    /// Validated quantities and prices multiply to at most 1e21.
    pub fn extend(self, price: UnitPrice) -> Money {
        Money::rounded(self.0 * price.0)
    }

    /// `self + rhs`, failing past [`MAX_QUANTITY`]
    pub fn checked_add(self, rhs: Quantity) -> Result<Quantity, String> {
        let sum = self
            .0
            .checked_add(rhs.0)
            .ok_or_else(|| format!("quantity {} + {} overflows", self, rhs))?;
        Quantity::try_new(sum)
    }

    /// Get the raw decimal value
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

// ============================================================================
// Rate
// ============================================================================

/// Markup fraction applied to a base cost (0.15 = 15%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(#[serde(with = "rust_decimal::serde::arbitrary_precision")] pub Decimal);

impl Rate {
    /// Create from whole percent: `Rate::percent(15)` is 0.15
    pub fn percent(pct: i64) -> Self {
        Rate(Decimal::new(pct, 2))
    }

    /// Parse a fraction such as `"0.15"`
    pub fn parse(raw: &str) -> Result<Self, String> {
        Rate::try_new(parse_decimal(raw)?)
    }

    /// Validate a decimal rate: between 0 and [`MAX_RATE`]
    pub fn try_new(value: Decimal) -> Result<Self, String> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(format!("rate {} is negative", value.normalize()));
        }
        if value > MAX_RATE {
            return Err(format!("rate {} exceeds {}", value.normalize(), MAX_RATE));
        }
        Ok(Rate(value))
    }

    /// Get the raw decimal value
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Display as a percentage, e.g. "15%"
    pub fn as_percent_string(self) -> String {
        format!("{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Which dimensional measure a category is priced by.
///
/// Attached to catalog entries so aggregation dispatches on data rather than
/// on a hardcoded list of category names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasureKind {
    /// Summed surface area (walls, slabs, roofs)
    Area,
    /// Summed length (beams, columns, pipe runs)
    Length,
    /// Summed volume (concrete, excavation)
    Volume,
    /// Number of elements (doors, windows, fixtures)
    Count,
}

impl MeasureKind {
    /// Lowercase name used in notes and reports
    pub fn name(&self) -> &'static str {
        match self {
            MeasureKind::Area => "area",
            MeasureKind::Length => "length",
            MeasureKind::Volume => "volume",
            MeasureKind::Count => "count",
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit a catalog price is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementUnit {
    /// Linear foot
    #[serde(rename = "LF")]
    LinearFoot,
    /// Square foot
    #[serde(rename = "SF")]
    SquareFoot,
    /// Cubic yard
    #[serde(rename = "CY")]
    CubicYard,
    /// Each (count)
    #[serde(rename = "EA")]
    Each,
    /// Meter
    #[serde(rename = "M")]
    Meter,
    /// Square meter
    #[serde(rename = "M2")]
    SquareMeter,
    /// Cubic meter
    #[serde(rename = "M3")]
    CubicMeter,
    /// Unspecified unit (fallback pricing)
    #[serde(rename = "UN")]
    Unspecified,
}

impl MeasurementUnit {
    /// Short code as written in catalogs and reports
    pub fn code(&self) -> &'static str {
        match self {
            MeasurementUnit::LinearFoot => "LF",
            MeasurementUnit::SquareFoot => "SF",
            MeasurementUnit::CubicYard => "CY",
            MeasurementUnit::Each => "EA",
            MeasurementUnit::Meter => "M",
            MeasurementUnit::SquareMeter => "M2",
            MeasurementUnit::CubicMeter => "M3",
            MeasurementUnit::Unspecified => "UN",
        }
    }

    /// The measure a price in this unit implies
    pub fn measure_kind(&self) -> MeasureKind {
        match self {
            MeasurementUnit::LinearFoot | MeasurementUnit::Meter => MeasureKind::Length,
            MeasurementUnit::SquareFoot | MeasurementUnit::SquareMeter => MeasureKind::Area,
            MeasurementUnit::CubicYard | MeasurementUnit::CubicMeter => MeasureKind::Volume,
            MeasurementUnit::Each | MeasurementUnit::Unspecified => MeasureKind::Count,
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_QUANTITY, dec("1000000000000"));
        assert_eq!(MAX_UNIT_PRICE, dec("1000000000"));
        assert_eq!(MAX_RATE, dec("10"));
    }

    #[test]
    fn test_extend_at_the_bounds() {
        let qty = Quantity::try_new(MAX_QUANTITY).unwrap();
        let price = UnitPrice::try_new(MAX_UNIT_PRICE).unwrap();
        assert_eq!(qty.extend(price).value(), dec("1000000000000000000000.00"));
        assert!(Quantity::try_new(MAX_QUANTITY + Decimal::ONE).is_err());
        assert!(UnitPrice::try_new(MAX_UNIT_PRICE + Decimal::ONE).is_err());
    }

    #[test]
    fn test_quantity_checked_add() {
        let half = Quantity::try_new(MAX_QUANTITY / Decimal::TWO).unwrap();
        assert_eq!(half.checked_add(half).unwrap().value(), MAX_QUANTITY);
        assert!(half.checked_add(half).unwrap().checked_add(Quantity::from_count(1)).is_err());
    }

    #[test]
    fn test_round_half_up_not_half_even() {
        // Banker's rounding would give 0.02 and 0.12
        assert_eq!(Money::rounded(dec("0.025")).to_string(), "0.03");
        assert_eq!(Money::rounded(dec("0.125")).to_string(), "0.13");
        assert_eq!(Money::rounded(dec("0.124999")).to_string(), "0.12");
    }

    #[test]
    fn test_extend_has_no_float_drift() {
        // 0.15 * 0.1 = 0.015 exactly; binary floats give 0.01499999...
        let qty = Quantity::parse("0.1").unwrap();
        let price = UnitPrice::parse("0.15").unwrap();
        assert_eq!(qty.extend(price), Money::from_cents(2));

        let qty = Quantity::parse("1.005").unwrap();
        let price = UnitPrice::parse("1").unwrap();
        assert_eq!(qty.extend(price).to_string(), "1.01");
    }

    #[test]
    fn test_quantity_parse() {
        assert_eq!(Quantity::parse(" 12.5 ").unwrap().value(), dec("12.5"));
        assert_eq!(Quantity::parse("1.25e2").unwrap().value(), dec("125"));
        assert_eq!(Quantity::parse("0").unwrap(), Quantity::zero());
        assert!(Quantity::parse("").is_err());
        assert!(Quantity::parse("ten").is_err());
        assert!(Quantity::parse("-3").is_err());
        assert!(Quantity::parse("1e13").is_err());
    }

    #[test]
    fn test_money_display_keeps_cents() {
        assert_eq!(Money::rounded(dec("185")).to_string(), "185.00");
        assert_eq!(Money::zero().to_string(), "0.00");
        assert_eq!(Money(dec("12.3")).to_string(), "12.30");
    }

    #[test]
    fn test_currency_string() {
        assert_eq!(Money::from_cents(125_000).to_currency_string("$"), "$1,250.00");
        assert_eq!(Money::from_cents(99).to_currency_string("$"), "$0.99");
        assert_eq!(Money::from_cents(123_456_789).to_currency_string("$"), "$1,234,567.89");
        assert_eq!(Money::from_cents(-50_000).to_currency_string("$"), "-$500.00");
    }

    #[test]
    fn test_apply_rate() {
        let base = Money::from_cents(100_000);
        assert_eq!(base.apply_rate(Rate::percent(15)), Some(Money::from_cents(15_000)));
        assert_eq!(Money::from_cents(333).apply_rate(Rate::percent(15)).unwrap().to_string(), "0.50");
        assert_eq!(Money(Decimal::MAX).apply_rate(Rate::percent(200)), None);
    }

    #[test]
    fn test_rate_bounds() {
        assert_eq!(Rate::parse("0").unwrap(), Rate(Decimal::ZERO));
        assert_eq!(Rate::parse("10").unwrap().value(), MAX_RATE);
        assert!(Rate::parse("-0.1").is_err());
        assert!(Rate::parse("10.01").is_err());
        assert!(Rate::parse("1e28").is_err());
        assert!(Rate::parse("79228162514264337593543950335").is_err());
    }

    #[test]
    fn test_unit_price_display() {
        assert_eq!(UnitPrice::parse("8.5").unwrap().to_string(), "8.50");
        assert_eq!(UnitPrice::parse("0.125").unwrap().to_string(), "0.125");
        assert!(UnitPrice::parse("-1").is_err());
    }

    #[test]
    fn test_money_sum() {
        let amounts = [Money::from_cents(10), Money::from_cents(20), Money::from_cents(70)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_cents(100));
    }

    #[test]
    fn test_serialization_is_exact_number() {
        let m = Money::from_cents(51_000);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "510.00");

        let roundtrip: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, roundtrip);

        let unit = serde_json::to_string(&MeasurementUnit::SquareFoot).unwrap();
        assert_eq!(unit, "\"SF\"");
    }

    #[test]
    fn test_unit_measure_kind() {
        assert_eq!(MeasurementUnit::LinearFoot.measure_kind(), MeasureKind::Length);
        assert_eq!(MeasurementUnit::SquareMeter.measure_kind(), MeasureKind::Area);
        assert_eq!(MeasurementUnit::CubicYard.measure_kind(), MeasureKind::Volume);
        assert_eq!(MeasurementUnit::Unspecified.measure_kind(), MeasureKind::Count);
    }

    #[test]
    fn test_rate_percent_string() {
        assert_eq!(Rate::percent(15).as_percent_string(), "15%");
        assert_eq!(Rate::parse("0.125").unwrap().as_percent_string(), "12.5%");
    }
}
