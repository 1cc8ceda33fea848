//! Ingredient amount parsing.
//!
//! Turns the loose `amount`/`unit` text the completion service produces
//! (e.g. `"1 1/2"`, `"tbsp"`) into an [`Amount`]. Nothing in here can fail:
//! unknown units become [`Unit::Abstract`] and unparseable amounts default
//! to one.

use serde::{Deserialize, Serialize};

/// Semantic unit tag for an ingredient amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    None,
    Abstract,
    Cup,
    Pint,
    Quart,
    Gallon,
    FluidOunce,
    Teaspoon,
    Tablespoon,
    Ounce,
    Pound,
    Gram,
    Kilogram,
    Quantity,
    Fraction,
}

/// Unit synonyms. Matching is case-sensitive.
const UNIT_SYNONYMS: &[(&str, Unit)] = &[
    ("", Unit::None),
    ("-", Unit::None),
    ("tbsp", Unit::Tablespoon),
    ("tablespoon", Unit::Tablespoon),
    ("tablespoons", Unit::Tablespoon),
    ("tsp", Unit::Teaspoon),
    ("teaspoon", Unit::Teaspoon),
    ("teaspoons", Unit::Teaspoon),
    ("cp", Unit::Cup),
    ("cup", Unit::Cup),
    ("cups", Unit::Cup),
    ("pt", Unit::Pint),
    ("pint", Unit::Pint),
    ("pints", Unit::Pint),
    ("fl oz", Unit::FluidOunce),
    ("floz", Unit::FluidOunce),
    ("fluid ounce", Unit::FluidOunce),
    ("fluid ounces", Unit::FluidOunce),
    ("oz", Unit::Ounce),
    ("ounce", Unit::Ounce),
    ("ounces", Unit::Ounce),
    ("lb", Unit::Pound),
    ("lbs", Unit::Pound),
    ("pound", Unit::Pound),
    ("pounds", Unit::Pound),
    ("g", Unit::Gram),
    ("gram", Unit::Gram),
    ("grams", Unit::Gram),
    ("kg", Unit::Kilogram),
    ("kilogram", Unit::Kilogram),
    ("kilograms", Unit::Kilogram),
    ("qty", Unit::Quantity),
    ("quantity", Unit::Quantity),
    ("quantities", Unit::Quantity),
    // Spellings present in historical fine-tuning data
    ("quanity", Unit::Quantity),
    ("quanities", Unit::Quantity),
    ("qt", Unit::Quart),
    ("quart", Unit::Quart),
    ("quarts", Unit::Quart),
    ("gal", Unit::Gallon),
    ("gallon", Unit::Gallon),
    ("gallons", Unit::Gallon),
];

impl Unit {
    /// Look up a unit by its text. Unrecognized text maps to `Abstract`.
    pub fn lookup(text: &str) -> Unit {
        UNIT_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == text)
            .map(|(_, unit)| *unit)
            .unwrap_or(Unit::Abstract)
    }
}

/// A resolved ingredient amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub unit: Unit,
    /// Unit text as the service returned it, kept for auditing.
    pub unit_text: String,
}

impl Amount {
    /// Resolve raw amount and unit text into an `Amount`.
    ///
    /// Unparseable amounts default to 1. A fractional amount counted in
    /// `qty` is retagged as [`Unit::Fraction`].
    pub fn resolve(amount_text: &str, unit_text: &str) -> Amount {
        let mut unit = Unit::lookup(unit_text);
        let (value, is_fraction) = parse_fraction(amount_text).unwrap_or((1.0, false));

        if is_fraction && unit == Unit::Quantity {
            unit = Unit::Fraction;
        }

        Amount {
            value,
            unit,
            unit_text: unit_text.to_string(),
        }
    }
}

/// Parse an amount of the form `w n/d`, `n/d`, a decimal, or an integer.
///
/// Returns the value and whether it was written (or is) fractional, or
/// `None` if the text does not start with a number. Text containing `/`
/// must match one of the fraction forms.
pub fn parse_fraction(text: &str) -> Option<(f64, bool)> {
    let text = text.trim();
    let mut words = text.split_whitespace();
    let first = words.next()?;

    if let (Some(whole), Some((n, d))) = (parse_whole(first), words.next().and_then(split_fraction))
    {
        return Some((whole + n / d, true));
    }

    if let Some((n, d)) = split_fraction(first) {
        return Some((n / d, true));
    }

    // A slash means fraction; a broken one is not a number
    if text.contains('/') {
        return None;
    }

    if first.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(value) = first.parse::<f64>() {
            if value.is_finite() {
                return Some((value, value.fract() != 0.0));
            }
        }
    }

    // Leading integer followed by something else, e.g. "2-3"
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    parse_whole(&digits).map(|value| (value, false))
}

fn parse_whole(s: &str) -> Option<f64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().map(|v| v as f64)
}

fn split_fraction(s: &str) -> Option<(f64, f64)> {
    let (numerator, denominator) = s.split_once('/')?;
    let n = parse_whole(numerator)?;
    let d = parse_whole(denominator)?;
    if d == 0.0 {
        return None;
    }
    Some((n, d))
}
