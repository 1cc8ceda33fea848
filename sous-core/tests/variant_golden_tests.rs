//! Golden file tests for reply parsing and variant expansion.
//!
//! Each fixture in `fixtures/variants/` holds a completion reply as the
//! ingredient-parsing prompt would return it, plus the ingredient lists of
//! every recipe variant expected from it, in output order.
//!
//! Test format:
//! ```json
//! {
//!   "reply": "index,basic_ingredient,...\n1,beef,1,pound,f,\n",
//!   "expected": [[{ "name": "beef", "value": 1.0, "unit": "pound", "optional": false }]]
//! }
//! ```

use glob::glob;
use serde::Deserialize;
use sous_core::response::parse_ingredient_rows;
use sous_core::transform::build_variant;
use sous_core::variants::expand_rows;
use sous_core::{IngredientItem, RawRecipe, Unit};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct TestCase {
    reply: String,
    expected: Vec<Vec<Expected>>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
struct Expected {
    name: String,
    value: f64,
    unit: Unit,
    optional: bool,
}

impl From<&IngredientItem> for Expected {
    fn from(item: &IngredientItem) -> Self {
        Self {
            name: item.name.clone(),
            value: item.amount.value,
            unit: item.amount.unit,
            optional: item.optional,
        }
    }
}

fn run_case(reply: &str) -> Vec<Vec<Expected>> {
    let rows = parse_ingredient_rows(reply).expect("fixture reply should parse");
    let raw = RawRecipe::default();
    expand_rows(&rows)
        .iter()
        .map(|selection| {
            build_variant(&raw, &rows, selection, &HashMap::new())
                .ingredients
                .iter()
                .map(Expected::from)
                .collect()
        })
        .collect()
}

fn load_test_cases() -> Vec<(String, TestCase)> {
    let pattern = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/variants/*.json");

    let mut cases = Vec::new();
    for entry in glob(&pattern.to_string_lossy()).expect("Failed to read glob pattern") {
        let path = entry.expect("Failed to read directory entry");
        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
        let case: TestCase = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
        cases.push((name, case));
    }

    cases.sort_by(|a, b| a.0.cmp(&b.0));
    cases
}

#[test]
fn test_variant_golden_files() {
    let cases = load_test_cases();
    assert!(!cases.is_empty(), "no fixtures found");

    let mut failures = Vec::new();
    for (name, case) in &cases {
        let actual = run_case(&case.reply);
        if actual != case.expected {
            failures.push((name.clone(), case.expected.clone(), actual));
        }
    }

    if !failures.is_empty() {
        let mut msg = format!("\n{} failures across {} tests:\n", failures.len(), cases.len());
        for (name, expected, actual) in &failures {
            msg.push_str(&format!("\n=== {} ===\n", name));
            msg.push_str(&format!("Expected: {:#?}\n", expected));
            msg.push_str(&format!("Actual:   {:#?}\n", actual));
        }
        panic!("{}", msg);
    }
}

#[test]
fn test_variant_count_is_product_of_group_sizes() {
    for (name, case) in load_test_cases() {
        let rows = parse_ingredient_rows(&case.reply).unwrap();
        let mut group_sizes: HashMap<u32, usize> = HashMap::new();
        let indices: Vec<_> = rows
            .iter()
            .map(|r| sous_core::variants::IngredientIndex::parse(&r.index))
            .collect();
        for index in &indices {
            if indices
                .iter()
                .any(|other| other.ordinal == index.ordinal && other.is_alternative())
            {
                *group_sizes.entry(index.ordinal).or_default() += 1;
            }
        }
        let expected: usize = group_sizes.values().product();
        assert_eq!(expand_rows(&rows).len(), expected, "{}", name);
    }
}
