//! Loading and preparing run input.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{RawRecipe, Recipe};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

fn read(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a YAML list of scraped recipes.
pub fn load_raw_recipes(path: &Path) -> Result<Vec<RawRecipe>, InputError> {
    let text = read(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&text).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load structured recipes from a file in the processor's output format.
pub fn load_recipes(path: &Path) -> Result<Vec<Recipe>, InputError> {
    let text = read(path)?;
    parse_recipe_stream(&text).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a stream of YAML documents, each a list of recipes or a single
/// recipe, into one flat list.
pub fn parse_recipe_stream(text: &str) -> Result<Vec<Recipe>, serde_yaml::Error> {
    let mut recipes = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        match serde_yaml::Value::deserialize(document)? {
            serde_yaml::Value::Null => {}
            value @ serde_yaml::Value::Sequence(_) => {
                recipes.extend(serde_yaml::from_value::<Vec<Recipe>>(value)?);
            }
            value => recipes.push(serde_yaml::from_value::<Recipe>(value)?),
        }
    }

    Ok(recipes)
}

/// Drop recipes whose source URL already appears in `reference`.
pub fn exclude_sources(recipes: Vec<RawRecipe>, reference: &[RawRecipe]) -> Vec<RawRecipe> {
    let seen: HashSet<&str> = reference
        .iter()
        .map(|r| r.metadata.source_url.as_str())
        .collect();

    recipes
        .into_iter()
        .filter(|r| !seen.contains(r.metadata.source_url.as_str()))
        .collect()
}

/// Group recipes that came from the same page, in first-seen order.
pub fn group_by_source_url(recipes: Vec<Recipe>) -> Vec<Vec<Recipe>> {
    let mut groups: Vec<Vec<Recipe>> = Vec::new();

    for recipe in recipes {
        let existing = groups
            .iter_mut()
            .find(|g| g[0].metadata.source_url == recipe.metadata.source_url);
        match existing {
            Some(group) => group.push(recipe),
            None => groups.push(vec![recipe]),
        }
    }

    groups
}

/// Uniformly sample up to `n` items.
pub fn sample<T, R: Rng + ?Sized>(mut items: Vec<T>, n: usize, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items.truncate(n);
    items
}
