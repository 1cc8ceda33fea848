//! Raw recipe to structured recipe variants.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Transformer, WorkerContext};
use crate::dietary::{DietaryFlag, DietaryFlags};
use crate::error::ProcessError;
use crate::llm::CompletionProvider;
use crate::prompts::{
    dietary_request, parse_ingredients_request, render_indexed_input, render_ingredient_input,
};
use crate::quantity::Amount;
use crate::response::{labels_by_ingredient, parse_dietary_rows, parse_ingredient_rows, ParsedIngredientRow};
use crate::types::{IngredientItem, RawRecipe, Recipe};
use crate::variants::expand_rows;

/// Move descriptions containing `" or "` to the front.
///
/// Two-pointer partition; relative order within either side is not kept.
pub fn reorder_ingredients(mut descriptions: Vec<String>) -> Vec<String> {
    if descriptions.is_empty() {
        return descriptions;
    }

    let mut i = 0;
    let mut j = descriptions.len() - 1;
    while i < j {
        if descriptions[i].contains(" or ") {
            i += 1;
        } else if descriptions[j].contains(" or ") {
            descriptions.swap(i, j);
            i += 1;
            j -= 1;
        } else {
            j -= 1;
        }
    }
    descriptions
}

fn to_ingredient(row: &ParsedIngredientRow) -> IngredientItem {
    IngredientItem {
        name: row.ingredient.clone(),
        amount: Amount::resolve(&row.amount, &row.unit),
        optional: row.optional.to_lowercase().contains('t'),
        notes: row.notes.clone(),
    }
}

/// Build one recipe variant from the rows at `selection`.
pub fn build_variant(
    raw: &RawRecipe,
    rows: &[ParsedIngredientRow],
    selection: &[usize],
    labels: &HashMap<String, Vec<DietaryFlag>>,
) -> Recipe {
    let chosen: Vec<&ParsedIngredientRow> = selection.iter().filter_map(|&i| rows.get(i)).collect();

    let mut recipe = raw.to_recipe();
    recipe.ingredients = chosen.iter().map(|row| to_ingredient(row)).collect();
    recipe.metadata.dietary =
        DietaryFlags::resolve(chosen.iter().map(|row| row.ingredient.as_str()), labels);
    recipe
}

/// Parses a raw recipe's ingredient lines through the completion service
/// and expands alternatives into one recipe per combination.
#[derive(Debug)]
pub struct RecipeTransformer {
    provider: Arc<dyn CompletionProvider>,
    classify_variants: bool,
}

impl RecipeTransformer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            classify_variants: false,
        }
    }

    /// Also classify each parsed ingredient's dietary restrictions with a
    /// second request, so variants carry real flags instead of all-true.
    pub fn with_variant_classification(mut self, enabled: bool) -> Self {
        self.classify_variants = enabled;
        self
    }

    async fn classify(
        &self,
        rows: &[ParsedIngredientRow],
        ctx: WorkerContext<'_>,
    ) -> Result<HashMap<String, Vec<DietaryFlag>>, ProcessError> {
        let completion = self
            .provider
            .complete(&dietary_request(render_indexed_input(rows)))
            .await?;
        let text = completion.first_text()?;
        ctx.sinks.info(&format!("{}: Dietary:\n{}", ctx.worker, text));

        let rows = parse_dietary_rows(text).map_err(ProcessError::malformed("dietary"))?;
        Ok(labels_by_ingredient(rows))
    }
}

#[async_trait]
impl Transformer for RecipeTransformer {
    type Item = RawRecipe;

    fn display_name(item: &RawRecipe) -> &str {
        &item.name
    }

    fn source_url(item: &RawRecipe) -> &str {
        &item.metadata.source_url
    }

    async fn process(
        &self,
        raw: &RawRecipe,
        ctx: WorkerContext<'_>,
    ) -> Result<Vec<Recipe>, ProcessError> {
        tracing::info!(
            worker = ctx.worker,
            recipe = %raw.name,
            source_url = %raw.metadata.source_url,
            "processing recipe"
        );

        let descriptions = reorder_ingredients(raw.ingredient_descriptions.clone());
        let request = parse_ingredients_request(render_ingredient_input(&descriptions));

        let completion = self.provider.complete(&request).await?;
        let text = completion.first_text()?;
        ctx.sinks.info(&format!(
            "{}: Parsed ingredients {}:\n{}",
            ctx.worker, raw.name, text
        ));

        let rows = parse_ingredient_rows(text).map_err(ProcessError::malformed("ingredient"))?;

        let labels = if self.classify_variants {
            self.classify(&rows, ctx).await?
        } else {
            HashMap::new()
        };

        Ok(expand_rows(&rows)
            .iter()
            .map(|selection| build_variant(raw, &rows, selection, &labels))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FakeProvider, LlmError};
    use crate::prompts::{dietary, parse_ingredients};
    use crate::quantity::Unit;
    use crate::sinks::{MemorySink, Sinks};
    use crate::types::RecipeMetadata;

    const STEAK_REPLY: &str = "index,basic_ingredient,amount,unit,optional,notes\n\
                               1,beef,1,pound,f,\n\
                               1a,pork,1,pound,f,\n\
                               2,salt,1,pinch,t,to taste\n";

    fn steak() -> RawRecipe {
        RawRecipe {
            name: "Steak".to_string(),
            description: "Seared".to_string(),
            ingredient_descriptions: vec![
                "a pinch of salt (optional)".to_string(),
                "1 pound of beef or pork".to_string(),
            ],
            steps: vec!["Sear".to_string()],
            metadata: RecipeMetadata {
                source_url: "https://example.com/steak".to_string(),
                ..Default::default()
            },
        }
    }

    fn sinks() -> (Sinks, MemorySink) {
        let diagnostic = MemorySink::new();
        let sinks = Sinks::from_writers(MemorySink::new(), diagnostic.clone(), MemorySink::new());
        (sinks, diagnostic)
    }

    #[test]
    fn test_reorder_moves_alternatives_first() {
        let reordered = reorder_ingredients(vec![
            "salt".to_string(),
            "beef or pork".to_string(),
            "flour".to_string(),
            "apples or pears".to_string(),
        ]);
        assert!(reordered[0].contains(" or "));
        assert!(reordered[1].contains(" or "));
        assert!(!reordered[2].contains(" or "));
        assert!(!reordered[3].contains(" or "));
    }

    #[test]
    fn test_reorder_is_permutation() {
        let input: Vec<String> = ["a", "b or c", "d", "e or f", "g"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut reordered = reorder_ingredients(input.clone());
        let mut expected = input;
        reordered.sort();
        expected.sort();
        assert_eq!(reordered, expected);
    }

    #[test]
    fn test_reorder_edge_cases() {
        assert!(reorder_ingredients(Vec::new()).is_empty());
        assert_eq!(reorder_ingredients(vec!["x".to_string()]), vec!["x"]);
        // "or" without surrounding spaces is not an alternative
        let reordered = reorder_ingredients(vec!["salt".to_string(), "orange".to_string()]);
        assert_eq!(reordered, vec!["salt", "orange"]);
    }

    #[test]
    fn test_build_variant_resolves_amounts() {
        let rows = parse_ingredient_rows("1,apples,1/2,qty,T,sliced\n2,flour,,,f,").unwrap();
        let recipe = build_variant(&steak(), &rows, &[0, 1], &HashMap::new());

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount.unit, Unit::Fraction);
        assert_eq!(recipe.ingredients[0].amount.value, 0.5);
        assert!(recipe.ingredients[0].optional);
        assert_eq!(recipe.ingredients[1].amount.value, 1.0);
        assert_eq!(recipe.ingredients[1].amount.unit, Unit::None);
        assert!(!recipe.ingredients[1].optional);
        assert_eq!(recipe.metadata.dietary, DietaryFlags::all_true());
    }

    #[tokio::test]
    async fn test_alternatives_become_variants() {
        let provider = FakeProvider::with_response("beef or pork", STEAK_REPLY);
        let transformer = RecipeTransformer::new(Arc::new(provider));
        let (sinks, diagnostic) = sinks();
        let ctx = WorkerContext { worker: 3, sinks: &sinks };

        let recipes = transformer.process(&steak(), ctx).await.unwrap();
        assert_eq!(recipes.len(), 2);

        let names: Vec<Vec<&str>> = recipes.iter().map(|r| r.ingredient_names().collect()).collect();
        assert_eq!(names, vec![vec!["beef", "salt"], vec!["pork", "salt"]]);

        for recipe in &recipes {
            assert_eq!(recipe.name, "Steak");
            assert_eq!(recipe.steps, vec!["Sear"]);
            assert_eq!(recipe.metadata.source_url, "https://example.com/steak");
            assert_eq!(recipe.metadata.dietary, DietaryFlags::all_true());
            assert!(recipe.ingredients[1].optional);
        }

        assert!(diagnostic.contents().starts_with("INFO::3: Parsed ingredients Steak:\n"));
    }

    #[tokio::test]
    async fn test_alternatives_sent_first() {
        let mut provider = FakeProvider::new();
        // only matches when the alternative line leads the input
        provider.add_response("1 pound of beef or pork\na pinch", STEAK_REPLY);
        let transformer = RecipeTransformer::new(Arc::new(provider));
        let (sinks, _) = sinks();

        let recipes = transformer
            .process(&steak(), WorkerContext { worker: 0, sinks: &sinks })
            .await
            .unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_classified_variants_carry_flags() {
        let mut provider = FakeProvider::new();
        provider.add_prompt_response(parse_ingredients::PROMPT_NAME, "beef", STEAK_REPLY);
        provider.add_prompt_response(
            dietary::PROMPT_NAME,
            "1a,pork",
            "index,ingredient,breaks\n\
             1,beef,not vegan,has red meat\n\
             1a,pork,not vegan,has pork,not halal\n\
             2,salt,\n",
        );
        let transformer =
            RecipeTransformer::new(Arc::new(provider)).with_variant_classification(true);
        let (sinks, _) = sinks();

        let recipes = transformer
            .process(&steak(), WorkerContext { worker: 0, sinks: &sinks })
            .await
            .unwrap();

        let beef = &recipes[0].metadata.dietary;
        assert!(!beef.is_vegan && !beef.is_red_meat_free);
        assert!(beef.is_pork_free && beef.is_halal);

        let pork = &recipes[1].metadata.dietary;
        assert!(!pork.is_vegan && !pork.is_pork_free && !pork.is_halal);
        assert!(pork.is_red_meat_free);
    }

    #[tokio::test]
    async fn test_empty_choices_is_service_error() {
        let mut provider = FakeProvider::new();
        provider.add_empty_reply("beef");
        let transformer = RecipeTransformer::new(Arc::new(provider));
        let (sinks, _) = sinks();

        let err = transformer
            .process(&steak(), WorkerContext { worker: 0, sinks: &sinks })
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Service(LlmError::NoChoices)));
    }

    #[tokio::test]
    async fn test_bad_reply_is_malformed() {
        let provider = FakeProvider::new().with_default_response("Sure! Here is the table you asked for.");
        let transformer = RecipeTransformer::new(Arc::new(provider));
        let (sinks, _) = sinks();

        let err = transformer
            .process(&steak(), WorkerContext { worker: 0, sinks: &sinks })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::MalformedResponse { kind: "ingredient", .. }
        ));
    }
}
