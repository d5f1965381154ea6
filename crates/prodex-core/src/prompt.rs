use crate::models::ExtractionPrompt;
use crate::template::PromptTemplate;

/// Maximum number of characters of reduced content embedded in a prompt.
pub const MAX_CONTENT_LENGTH: usize = 5000;

/// Appended to the excerpt when content beyond the budget was dropped.
pub const TRUNCATION_MARKER: &str = "...[content truncated due to size]";

/// Renders extraction prompts from a template and a bounded content excerpt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
    content_budget: usize,
}

impl PromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self {
            template,
            content_budget: MAX_CONTENT_LENGTH,
        }
    }

    pub fn with_content_budget(mut self, budget: usize) -> Self {
        self.content_budget = budget;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn build(&self, url: &str, content: &str) -> ExtractionPrompt {
        let excerpt = truncate_content(content, self.content_budget);
        ExtractionPrompt::new(self.template.render(url, &excerpt))
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PromptTemplate::builtin())
    }
}

/// Cut `content` to `budget` characters, appending [`TRUNCATION_MARKER`] if
/// anything was dropped. Counts `char`s, never splitting a code point.
pub fn truncate_content(content: &str, budget: usize) -> String {
    match content.char_indices().nth(budget) {
        None => content.to_string(),
        Some((cut, _)) => {
            tracing::debug!(
                chars = content.chars().count(),
                budget,
                "Content too large, truncating"
            );
            let mut excerpt = String::with_capacity(cut + TRUNCATION_MARKER.len());
            excerpt.push_str(&content[..cut]);
            excerpt.push_str(TRUNCATION_MARKER);
            excerpt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excerpt_of(prompt: &ExtractionPrompt) -> &str {
        let text = prompt.as_str();
        let start = text.find("Product Content:\n").unwrap() + "Product Content:\n".len();
        let end = text.find("\n\nExtract the following information").unwrap();
        &text[start..end]
    }

    #[test]
    fn test_content_at_budget_is_not_truncated() {
        let content = "a".repeat(MAX_CONTENT_LENGTH);
        let prompt = PromptBuilder::default().build("https://shop.test", &content);

        assert_eq!(excerpt_of(&prompt), content);
        assert!(!prompt.as_str().contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_content_over_budget_is_cut_and_marked() {
        let content = format!("{}b", "a".repeat(MAX_CONTENT_LENGTH));
        let prompt = PromptBuilder::default().build("https://shop.test", &content);

        let excerpt = excerpt_of(&prompt);
        let kept = excerpt.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(kept.chars().count(), MAX_CONTENT_LENGTH);
        assert!(!kept.contains('b'));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let out = truncate_content("héllo wörld", 5);
        assert_eq!(out, format!("héllo{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::default();
        let a = builder.build("https://shop.test/p/1", "Acme Widget: $19.99");
        let b = builder.build("https://shop.test/p/1", "Acme Widget: $19.99");
        assert_eq!(a, b);
        assert!(a.as_str().contains("Original URL: https://shop.test/p/1"));
    }

    #[test]
    fn test_custom_budget() {
        let template = PromptTemplate::new("t", "{{url}}|{{content}}").unwrap();
        let builder = PromptBuilder::new(template).with_content_budget(3);
        assert_eq!(
            builder.build("u", "abcdef").as_str(),
            format!("u|abc{TRUNCATION_MARKER}")
        );
        assert_eq!(builder.build("u", "abc").as_str(), "u|abc");
    }
}
