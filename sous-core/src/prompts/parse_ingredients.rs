//! Ingredient parsing prompt: free-text ingredient lines in, one CSV row per
//! basic ingredient out.

use super::{TEMPERATURE, TOP_P};
use crate::llm::CompletionRequest;

/// Prompt name for cache keys.
pub const PROMPT_NAME: &str = "parse_ingredients";

pub const INSTRUCTION: &str = r#"Make csv with headers: index,basic_ingredient,amount,unit,optional,notes.
Extract the most basic ingredient. Remove cooking tools like spray! Amount must be a number or fraction.
If multiple options given for an ingredient, give the same index, enumerate by letter.
The word or usually indicates multiple options. If no unit or amount, make blank field. Make optional t or f. Use qty for quantity.
Example:
1 pound of beef or pork
1/2 cup of all-purpose flour
Blue food coloring
4 large apples or 2 medium pears,chopped
Can add garlic as garnish
a pinch of salt (optional)

becomes

index,basic_ingredient,amount,unit,optional,notes
1,beef,1,pound,f,
1a,pork,1,pound,f,
2,flour,1/2,cup,f,all-purpose
3,food coloring,,,f,blue
4,apples,4,qty,f,large,chopped
4a,pears,2,qty,f,medium,chopped
5,garlic,,,t,garnish
6,salt,1,pinch,t,
"#;

/// One description per line, each newline-terminated.
pub fn render_ingredient_input<S: AsRef<str>>(descriptions: &[S]) -> String {
    descriptions.iter().fold(String::new(), |mut out, line| {
        out.push_str(line.as_ref());
        out.push('\n');
        out
    })
}

pub fn parse_ingredients_request(input: String) -> CompletionRequest {
    CompletionRequest {
        prompt_name: PROMPT_NAME,
        instruction: INSTRUCTION,
        input,
        temperature: TEMPERATURE,
        top_p: TOP_P,
    }
}
