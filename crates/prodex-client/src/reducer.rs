use std::sync::LazyLock;

use prodex_core::error::AppError;
use prodex_core::traits::Reducer;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html};

/// Largest HTML document accepted for reduction (10 MiB).
pub const MAX_HTML_BYTES: usize = 10 * 1024 * 1024;

/// Deepest element nesting walked before giving up.
pub const MAX_DEPTH: usize = 512;

/// Structural and non-visible elements that never carry product text.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "iframe", "svg", "meta", "link", "noscript",
];

/// Class tokens marking hidden widgets and off-product sections.
const NOISE_CLASSES: &[&str] = &[
    "hidden",
    "related-products",
    "recommendations",
    "reviews",
    "comments",
];

const HIDDEN_STYLES: &[&str] = &[
    "display: none",
    "display:none",
    "visibility: hidden",
    "visibility:hidden",
];

/// Text is taken from the first of these containers that yields any.
const CONTENT_ROOTS: &[&str] = &["main", "article", "body"];

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex is valid"));
static COLON_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*:\s*").expect("hardcoded regex is valid"));

/// Reduces a product page to the plain text an LLM needs.
///
/// Parses the document with `scraper` (html5ever, so malformed markup is
/// recovered rather than rejected), drops noise and hidden subtrees, takes
/// the text of `main`, then `article`, then `body`, and flattens it onto a
/// single line.
#[derive(Debug, Clone)]
pub struct HtmlReducer {
    max_bytes: usize,
    max_depth: usize,
}

impl HtmlReducer {
    pub fn new() -> Self {
        Self::with_limits(MAX_HTML_BYTES, MAX_DEPTH)
    }

    pub fn with_limits(max_bytes: usize, max_depth: usize) -> Self {
        Self {
            max_bytes,
            max_depth,
        }
    }

    /// Concatenated text of the outermost surviving `target` elements.
    fn select_text(&self, root: ElementRef<'_>, target: &str) -> Result<String, AppError> {
        let mut out = String::new();
        self.find(root, target, 1, &mut out)?;
        Ok(out)
    }

    fn find(
        &self,
        element: ElementRef<'_>,
        target: &str,
        depth: usize,
        out: &mut String,
    ) -> Result<(), AppError> {
        self.check_depth(depth)?;
        if is_noise(element.value()) {
            return Ok(());
        }
        if element.value().name() == target {
            return self.collect(element, depth, out);
        }
        for child in element.children().filter_map(ElementRef::wrap) {
            self.find(child, target, depth + 1, out)?;
        }
        Ok(())
    }

    fn collect(&self, element: ElementRef<'_>, depth: usize, out: &mut String) -> Result<(), AppError> {
        self.check_depth(depth)?;
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(&text.text);
            } else if let Some(child) = ElementRef::wrap(child) {
                if !is_noise(child.value()) {
                    self.collect(child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), AppError> {
        if depth > self.max_depth {
            return Err(AppError::ReductionError(format!(
                "element nesting exceeds {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }
}

impl Default for HtmlReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for HtmlReducer {
    fn reduce(&self, html: &str) -> Result<String, AppError> {
        if html.len() > self.max_bytes {
            return Err(AppError::ReductionError(format!(
                "document is {} bytes, limit is {}",
                html.len(),
                self.max_bytes
            )));
        }

        let document = Html::parse_document(html);
        let root = document.root_element();

        let mut text = String::new();
        for target in CONTENT_ROOTS {
            text = self.select_text(root, target)?;
            if !text.is_empty() {
                tracing::debug!(container = target, "Selected content container");
                break;
            }
        }

        let reduced = normalize_whitespace(&text);
        tracing::debug!(chars = reduced.chars().count(), "Reduced content: {reduced}");
        Ok(reduced)
    }
}

fn is_noise(element: &Element) -> bool {
    if NOISE_TAGS.contains(&element.name()) {
        return true;
    }
    if element.attr("disabled").is_some()
        || element.attr("aria-disabled") == Some("true")
        || element.attr("aria-hidden") == Some("true")
    {
        return true;
    }
    if let Some(class) = element.attr("class") {
        if class.contains("disabled")
            || class
                .split_ascii_whitespace()
                .any(|token| NOISE_CLASSES.contains(&token))
        {
            return true;
        }
    }
    element
        .attr("style")
        .is_some_and(|style| HIDDEN_STYLES.iter().any(|hidden| style.contains(hidden)))
}

/// Collapse every whitespace run (newlines included) to one space and space
/// key/value colons as `key: value`.
pub fn normalize_whitespace(text: &str) -> String {
    let text = WHITESPACE_RUNS.replace_all(text, " ");
    let text = COLON_SPACING.replace_all(&text, ": ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(html: &str) -> String {
        HtmlReducer::new().reduce(html).unwrap()
    }

    #[test]
    fn test_strips_noise_elements() {
        let html = "<html><head><style>p{}</style></head><body>\
                    <main><script>X</script>Y</main></body></html>";
        let text = reduce(html);
        assert!(text.contains('Y'));
        assert!(!text.contains('X'));
    }

    #[test]
    fn test_strips_structural_chrome() {
        let html = r#"<body>
            <header>Site header</header>
            <nav>Home | Shop</nav>
            <div>Acme Widget</div>
            <iframe>ad</iframe>
            <noscript>Enable JS</noscript>
            <footer>Copyright</footer>
        </body>"#;
        assert_eq!(reduce(html), "Acme Widget");
    }

    #[test]
    fn test_strips_hidden_and_disabled_elements() {
        let html = r#"<main>
            <p>Visible</p>
            <p style="display:none">A</p>
            <p style="color: red; visibility: hidden">B</p>
            <p aria-hidden="true">C</p>
            <p class="tooltip hidden">D</p>
            <button disabled>E</button>
            <span aria-disabled="true">F</span>
            <option class="size-disabled">G</option>
        </main>"#;
        assert_eq!(reduce(html), "Visible");
    }

    #[test]
    fn test_hidden_class_matches_whole_tokens_only() {
        let html = r#"<main><p class="hidden-xs">Shown on desktop</p></main>"#;
        assert_eq!(reduce(html), "Shown on desktop");
    }

    #[test]
    fn test_strips_off_product_sections() {
        let html = r#"<main>
            <h1>Trail Shoe</h1>
            <section class="reviews">Great shoe!</section>
            <div class="carousel related-products">Other shoe</div>
            <div class="recommendations">You may also like</div>
            <div class="comments">First!</div>
        </main>"#;
        assert_eq!(reduce(html), "Trail Shoe");
    }

    #[test]
    fn test_prefers_main_then_article_then_body() {
        let with_main = "<body><article>Article</article><main>Main</main></body>";
        assert_eq!(reduce(with_main), "Main");

        let with_article = "<body><div>Outside</div><article>Article</article></body>";
        assert_eq!(reduce(with_article), "Article");

        let body_only = "<body><div>Only body</div></body>";
        assert_eq!(reduce(body_only), "Only body");
    }

    #[test]
    fn test_empty_main_falls_back() {
        let html = "<body><main><script>x</script></main><article>Article</article></body>";
        assert_eq!(reduce(html), "Article");
    }

    #[test]
    fn test_whitespace_only_main_still_wins() {
        let html = "<body><main>\n   \n</main><article>Article</article></body>";
        assert_eq!(reduce(html), "");
    }

    #[test]
    fn test_multiple_main_elements_are_concatenated() {
        let html = "<body><main>One</main><div>skip</div><main>Two</main></body>";
        assert_eq!(reduce(html), "OneTwo");
    }

    #[test]
    fn test_normalizes_whitespace_and_colons() {
        let html = "<main>\n  Price :   $19.99\t\n\n\n  Color:Red   Blue  \n</main>";
        assert_eq!(reduce(html), "Price: $19.99 Color: Red Blue");
    }

    #[test]
    fn test_block_elements_flatten_to_one_line() {
        let html = "<main>\n<h1>Trail Shoe</h1>\n<ul>\n  <li>Size: 42</li>\n  <li>Color: Grey</li>\n</ul>\n</main>";
        let text = reduce(html);
        assert_eq!(text, "Trail Shoe Size: 42 Color: Grey");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_normalize_whitespace_directly() {
        assert_eq!(normalize_whitespace("  a \t b  "), "a b");
        assert_eq!(normalize_whitespace("a \n \n b"), "a b");
        assert_eq!(normalize_whitespace("Weight :200g"), "Weight: 200g");
        assert_eq!(normalize_whitespace("a\u{a0}\u{a0}b"), "a b");
    }

    #[test]
    fn test_empty_and_malformed_input() {
        assert_eq!(reduce(""), "");
        assert_eq!(reduce("<body><script>only()</script></body>"), "");
        assert_eq!(
            reduce("<main><div><p>Unclosed <b>bold</main>"),
            "Unclosed bold"
        );
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let html = r#"<html><body><main>
            <h1>Acme Widget</h1><p class="price">Price: $19.99</p>
            <ul><li>Size: M</li><li>Size: L</li></ul>
        </main></body></html>"#;
        let reducer = HtmlReducer::new();
        assert_eq!(reducer.reduce(html).unwrap(), reducer.reduce(html).unwrap());
    }

    #[test]
    fn test_oversized_document_is_rejected() {
        let reducer = HtmlReducer::with_limits(32, MAX_DEPTH);
        let err = reducer
            .reduce("<main>this document is longer than thirty-two bytes</main>")
            .unwrap_err();
        assert!(matches!(err, AppError::ReductionError(_)));
    }

    #[test]
    fn test_excessive_nesting_is_rejected() {
        let html = format!("<body>{}deep{}</body>", "<div>".repeat(600), "</div>".repeat(600));
        let err = HtmlReducer::new().reduce(&html).unwrap_err();
        assert!(err.to_string().contains("nesting exceeds 512"));
    }

    #[test]
    fn test_nesting_within_limit_is_accepted() {
        let html = format!("<body>{}deep{}</body>", "<div>".repeat(100), "</div>".repeat(100));
        assert_eq!(reduce(&html), "deep");
    }
}
