//! Parsing of the completion service's comma-separated replies.
//!
//! The service is asked to echo a header row, but it is not guaranteed to.
//! A reply whose first line is not the expected header is still accepted if
//! it starts with a `0` or `1` (the first index under a zero- or one-based
//! enumeration); anything else is rejected as malformed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dietary::DietaryFlag;

/// Header requested for ingredient rows.
pub const INGREDIENT_HEADER: &str = "index,basic_ingredient,amount,unit,optional,notes";

/// Header requested for dietary-label rows.
pub const DIETARY_HEADER: &str = "index,ingredient,breaks";

const INGREDIENT_MIN_FIELDS: usize = 6;
const DIETARY_MIN_FIELDS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("empty response")]
    Empty,

    #[error("bad header: expected {expected:?}, got {found:?}")]
    BadHeader {
        expected: &'static str,
        found: String,
    },

    #[error("bad line (expected at least {min_fields} fields): {line}")]
    BadLine { line: String, min_fields: usize },
}

/// One row of an ingredient-parsing reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIngredientRow {
    /// Ordinal in the original description list, optionally letter-suffixed.
    pub index: String,
    pub ingredient: String,
    pub amount: String,
    pub unit: String,
    pub optional: String,
    pub notes: String,
}

/// One row of a dietary-classification reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DietaryRow {
    pub index: String,
    pub ingredient: String,
    /// Recognized violations; unknown labels are dropped.
    pub violations: Vec<DietaryFlag>,
}

/// Split a reply into its data lines, skipping the header when present.
fn data_lines<'a>(
    text: &'a str,
    header: &'static str,
) -> Result<impl Iterator<Item = &'a str>, ResponseError> {
    let text = text.trim();
    let mut lines = text.lines().peekable();

    let first = match lines.peek().copied() {
        Some(line) if !line.trim().is_empty() => line.trim(),
        _ => return Err(ResponseError::Empty),
    };

    if first == header {
        lines.next();
    } else if !first.starts_with(['0', '1']) {
        return Err(ResponseError::BadHeader {
            expected: header,
            found: first.to_string(),
        });
    }

    Ok(lines)
}

/// Parse an ingredient-parsing reply.
///
/// Fields past the sixth belong to the notes, which may themselves contain
/// commas.
pub fn parse_ingredient_rows(text: &str) -> Result<Vec<ParsedIngredientRow>, ResponseError> {
    data_lines(text, INGREDIENT_HEADER)?
        .map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < INGREDIENT_MIN_FIELDS {
                return Err(ResponseError::BadLine {
                    line: line.to_string(),
                    min_fields: INGREDIENT_MIN_FIELDS,
                });
            }

            Ok(ParsedIngredientRow {
                index: parts[0].trim().to_string(),
                ingredient: parts[1].trim().to_string(),
                amount: parts[2].trim().to_string(),
                unit: parts[3].trim().to_string(),
                optional: parts[4].trim().to_string(),
                notes: parts[5..].join(",").trim().to_string(),
            })
        })
        .collect()
}

/// Parse a dietary-classification reply.
pub fn parse_dietary_rows(text: &str) -> Result<Vec<DietaryRow>, ResponseError> {
    data_lines(text, DIETARY_HEADER)?
        .map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < DIETARY_MIN_FIELDS {
                return Err(ResponseError::BadLine {
                    line: line.to_string(),
                    min_fields: DIETARY_MIN_FIELDS,
                });
            }

            Ok(DietaryRow {
                index: parts[0].trim().to_string(),
                ingredient: parts[1].trim().to_string(),
                violations: parts[2..]
                    .iter()
                    .filter_map(|label| DietaryFlag::from_label(label))
                    .collect(),
            })
        })
        .collect()
}

/// Index dietary rows by ingredient name.
///
/// A later row for the same name replaces an earlier one.
pub fn labels_by_ingredient(rows: Vec<DietaryRow>) -> HashMap<String, Vec<DietaryFlag>> {
    rows.into_iter()
        .map(|row| (row.ingredient, row.violations))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_rows_with_header() {
        let reply = "index,basic_ingredient,amount,unit,optional,notes\n\
                     1,beef,1,pound,f,\n\
                     1a,pork,1,pound,f,\n\
                     2,flour,1/2,cup,f,all-purpose\n";
        let rows = parse_ingredient_rows(reply).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].index, "1a");
        assert_eq!(rows[1].ingredient, "pork");
        assert_eq!(rows[2].amount, "1/2");
        assert_eq!(rows[2].notes, "all-purpose");
    }

    #[test]
    fn test_ingredient_rows_without_header() {
        let reply = "1,beef,1,pound,f,\n2,salt,1,pinch,t,";
        let rows = parse_ingredient_rows(reply).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ingredient, "beef");
    }

    #[test]
    fn test_notes_keep_extra_commas() {
        let reply = "1,apples,4,qty,f,large,chopped";
        let rows = parse_ingredient_rows(reply).unwrap();
        assert_eq!(rows[0].notes, "large,chopped");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let reply = "\n\n  index,basic_ingredient,amount,unit,optional,notes\n1, beef ,1, pound,f,  \n\n";
        let rows = parse_ingredient_rows(reply).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ingredient, "beef");
        assert_eq!(rows[0].unit, "pound");
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let err = parse_ingredient_rows("Here is your table:\n1,beef,1,pound,f,").unwrap_err();
        assert!(matches!(err, ResponseError::BadHeader { .. }));
    }

    #[test]
    fn test_empty_reply_is_rejected() {
        assert_eq!(parse_ingredient_rows("   \n "), Err(ResponseError::Empty));
    }

    #[test]
    fn test_short_line_is_rejected() {
        let err = parse_ingredient_rows("1,beef,1,pound,f,\n2,flour").unwrap_err();
        assert_eq!(
            err,
            ResponseError::BadLine {
                line: "2,flour".to_string(),
                min_fields: 6
            }
        );
    }

    #[test]
    fn test_dietary_rows_with_header() {
        let reply = "index,ingredient,breaks\n\
                     0,beef,not vegan, not vegetarian,not halal\n\
                     1,flour,has gluten\n\
                     2,apple,";
        let rows = parse_dietary_rows(reply).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].violations,
            vec![DietaryFlag::Vegan, DietaryFlag::Vegetarian, DietaryFlag::Halal]
        );
        assert_eq!(rows[1].violations, vec![DietaryFlag::GlutenFree]);
        assert!(rows[2].violations.is_empty());
    }

    #[test]
    fn test_dietary_rows_zero_based_without_header() {
        let reply = "0, beef,Not Vegan\n1, beer,has alcohol,tasty";
        let rows = parse_dietary_rows(reply).unwrap();
        assert_eq!(rows[0].ingredient, "beef");
        assert_eq!(rows[0].violations, vec![DietaryFlag::Vegan]);
        assert_eq!(rows[1].violations, vec![DietaryFlag::AlcoholFree]);
    }

    #[test]
    fn test_dietary_single_field_line_is_rejected() {
        let err = parse_dietary_rows("0,beef\n1").unwrap_err();
        assert!(matches!(err, ResponseError::BadLine { min_fields: 2, .. }));
    }

    #[test]
    fn test_labels_by_ingredient() {
        let rows = parse_dietary_rows("0,beef,not vegan\n1,eggs,has eggs").unwrap();
        let labels = labels_by_ingredient(rows);
        assert_eq!(labels["beef"], vec![DietaryFlag::Vegan]);
        assert_eq!(labels["eggs"], vec![DietaryFlag::EggFree]);
    }
}
