//! Fake completion provider for testing.
//!
//! This provider returns deterministic replies based on input matching,
//! allowing tests and dry runs without network access or API costs.

use super::{Completion, CompletionProvider, CompletionRequest, LlmError};
use crate::prompts::{dietary, parse_ingredients};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    NoChoices,
}

#[derive(Debug, Clone)]
struct Rule {
    prompt_name: Option<String>,
    input_contains: String,
    reply: Reply,
}

/// A fake completion provider.
///
/// Replies are matched by checking whether the request input contains a
/// registered substring, in registration order. If nothing matches, the
/// default reply is used, or the request fails.
#[derive(Debug, Default)]
pub struct FakeProvider {
    rules: Vec<Rule>,
    default_reply: Option<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    /// Create a new FakeProvider with no registered replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a FakeProvider that returns a specific reply for inputs containing a substring.
    pub fn with_response(input_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(input_contains, response);
        provider
    }

    /// Add a reply for inputs containing a specific substring (case-insensitive).
    pub fn add_response(&mut self, input_contains: &str, response: &str) {
        self.rules.push(Rule {
            prompt_name: None,
            input_contains: input_contains.to_lowercase(),
            reply: Reply::Text(response.to_string()),
        });
    }

    /// Like `add_response`, but only for requests built from the named prompt.
    pub fn add_prompt_response(&mut self, prompt_name: &str, input_contains: &str, response: &str) {
        self.rules.push(Rule {
            prompt_name: Some(prompt_name.to_string()),
            input_contains: input_contains.to_lowercase(),
            reply: Reply::Text(response.to_string()),
        });
    }

    /// Reply with an empty choice list for matching inputs.
    pub fn add_empty_reply(&mut self, input_contains: &str) {
        self.rules.push(Rule {
            prompt_name: None,
            input_contains: input_contains.to_lowercase(),
            reply: Reply::NoChoices,
        });
    }

    /// Set the default reply when no rule matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_reply = Some(response.to_string());
        self
    }

    /// Canned replies for dry runs: every ingredient request parses to the
    /// same beef-or-pork table and every classification request labels it.
    pub fn with_sample_replies() -> Self {
        let mut provider = Self::new();

        provider.add_prompt_response(
            parse_ingredients::PROMPT_NAME,
            "",
            "index,basic_ingredient,amount,unit,optional,notes\n\
             0,beef,1,pound,f,\n\
             0a,pork,1,pound,f,\n\
             1,salt,1,teaspoon,t,to taste\n",
        );

        provider.add_prompt_response(
            dietary::PROMPT_NAME,
            "",
            "index,ingredient,breaks\n\
             0,beef,not vegan,not vegetarian,has red meat\n\
             1,pork,not vegan,not vegetarian,has pork,not kosher,not halal\n\
             2,salt,\n",
        );

        provider
    }

    /// Number of requests this provider has answered or failed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let input_lower = request.input.to_lowercase();
        let matched = self.rules.iter().find(|rule| {
            rule.prompt_name
                .as_deref()
                .map_or(true, |name| name == request.prompt_name)
                && input_lower.contains(&rule.input_contains)
        });

        if let Some(rule) = matched {
            return Ok(match &rule.reply {
                Reply::Text(text) => Completion::from_text(text.clone()),
                Reply::NoChoices => Completion::default(),
            });
        }

        match &self.default_reply {
            Some(text) => Ok(Completion::from_text(text.clone())),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for input (first 100 chars): {}",
                request.input.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt_name: &'static str, input: &str) -> CompletionRequest {
        CompletionRequest {
            prompt_name,
            instruction: "instruction",
            input: input.to_string(),
            temperature: 0.1,
            top_p: 0.6,
        }
    }

    #[tokio::test]
    async fn test_fake_provider_matching() {
        let provider = FakeProvider::with_response("hello", "world");
        let result = provider.complete(&request("p", "Say hello")).await.unwrap();
        assert_eq!(result.first_text().unwrap(), "world");
    }

    #[tokio::test]
    async fn test_fake_provider_case_insensitive() {
        let provider = FakeProvider::with_response("HELLO", "world");
        let result = provider.complete(&request("p", "hello there")).await.unwrap();
        assert_eq!(result.first_text().unwrap(), "world");
    }

    #[tokio::test]
    async fn test_fake_provider_no_match() {
        let provider = FakeProvider::new();
        let result = provider.complete(&request("p", "random input")).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_provider_default_response() {
        let provider = FakeProvider::new().with_default_response("default");
        let result = provider.complete(&request("p", "random")).await.unwrap();
        assert_eq!(result.first_text().unwrap(), "default");
    }

    #[tokio::test]
    async fn test_first_registered_rule_wins() {
        let mut provider = FakeProvider::new();
        provider.add_response("beef", "first");
        provider.add_response("beef", "second");
        let result = provider.complete(&request("p", "beef")).await.unwrap();
        assert_eq!(result.first_text().unwrap(), "first");
    }

    #[tokio::test]
    async fn test_prompt_scoped_rule() {
        let mut provider = FakeProvider::new();
        provider.add_prompt_response("a", "beef", "from a");
        provider.add_prompt_response("b", "beef", "from b");
        let result = provider.complete(&request("b", "beef")).await.unwrap();
        assert_eq!(result.first_text().unwrap(), "from b");
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let mut provider = FakeProvider::new();
        provider.add_empty_reply("nothing");
        let result = provider.complete(&request("p", "nothing here")).await.unwrap();
        assert!(result.choices.is_empty());
    }

    #[tokio::test]
    async fn test_sample_replies_cover_both_prompts() {
        let provider = FakeProvider::with_sample_replies();
        let parsed = provider
            .complete(&request(parse_ingredients::PROMPT_NAME, "anything"))
            .await
            .unwrap();
        assert!(parsed.first_text().unwrap().contains("0a,pork"));

        let labels = provider
            .complete(&request(dietary::PROMPT_NAME, "0, beef\n"))
            .await
            .unwrap();
        assert!(labels.first_text().unwrap().contains("has red meat"));
    }
}
