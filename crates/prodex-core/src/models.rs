use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Raw HTML retrieved for a product URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub url: String,
    pub html: String,
}

/// The fully rendered instruction text sent to the model as the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPrompt(String);

impl ExtractionPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ExtractionPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price information for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub current: Option<f64>,
    /// Pre-sale price, when the product is discounted.
    pub original: Option<f64>,
    /// Currency code or symbol as it appeared on the page.
    pub currency: Option<String>,
}

/// Structured product data in its normalized shape.
///
/// Every key is always serialized: missing scalars become `null`, missing
/// maps `{}` and missing image lists `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub pricing: Pricing,
    /// Variant options (sizes, colors, materials, ...), keys inferred per product.
    pub attributes: Map<String, Value>,
    pub description: Option<String>,
    /// Technical details, keys inferred per product.
    pub specifications: Map<String, Value>,
    pub images: Vec<String>,
}

impl ProductRecord {
    /// Coerce an untyped model answer into the product shape.
    ///
    /// Unknown keys are dropped and mistyped values become absent; only a
    /// non-object root is rejected.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let object = value.as_object().ok_or_else(|| {
            AppError::SchemaValidationError(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            ))
        })?;

        let pricing = object
            .get("pricing")
            .and_then(Value::as_object)
            .map(|p| Pricing {
                current: p.get("current").and_then(coerce_price),
                original: p.get("original").and_then(coerce_price),
                currency: p.get("currency").and_then(coerce_string),
            })
            .unwrap_or_default();

        Ok(Self {
            url: object.get("url").and_then(coerce_string),
            title: object.get("title").and_then(coerce_string),
            category: object.get("category").and_then(coerce_string),
            brand: object.get("brand").and_then(coerce_string),
            pricing,
            attributes: coerce_map(object.get("attributes")),
            description: object.get("description").and_then(coerce_string),
            specifications: coerce_map(object.get("specifications")),
            images: coerce_images(object.get("images")),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts numbers and numeric strings such as `"$1,299.00"`, `"19,99 €"` or
/// `"1.299,00 €"`.
fn coerce_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

fn is_separator(c: char) -> bool {
    c == '.' || c == ','
}

/// Parse a price written with either `.` or `,` as the decimal mark.
///
/// The last separator is decimal when one or two digits follow it and a
/// thousands separator when exactly three do. Anything else, or grouping
/// that is not in threes, is rejected rather than guessed.
fn parse_price(text: &str) -> Option<f64> {
    let negative = text.chars().find(|c| c.is_ascii_digit() || *c == '-') == Some('-');
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || is_separator(*c))
        .collect();

    let body = kept.trim_end_matches(is_separator);
    let trimmed = body.trim_start_matches(is_separator);
    // A single leading mark is a decimal point (".99"); longer runs are noise.
    let body = if body.len() - trimmed.len() == 1 { body } else { trimmed };
    if !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let (integer, fraction, decimal_mark) = match body.rfind(is_separator) {
        Some(i) => {
            let tail = &body[i + 1..];
            match tail.len() {
                1 | 2 => (&body[..i], tail, body[i..].chars().next()),
                3 => (body, "", None),
                _ => return None,
            }
        }
        None => (body, "", None),
    };

    let integer = strip_grouping(integer, decimal_mark)?;
    let integer = if integer.is_empty() { "0".to_string() } else { integer };
    let number = if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    };

    let price = number.parse::<f64>().ok().filter(|p| p.is_finite())?;
    Some(if negative { -price } else { price })
}

/// Remove thousands separators, checking they group digits in threes.
fn strip_grouping(integer: &str, decimal_mark: Option<char>) -> Option<String> {
    let Some(mark) = integer.chars().find(|c| is_separator(*c)) else {
        return Some(integer.to_string());
    };
    if Some(mark) == decimal_mark || integer.chars().any(|c| is_separator(c) && c != mark) {
        return None;
    }

    let mut groups = integer.split(mark);
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || lead.starts_with('0') {
        return None;
    }
    let mut digits = lead.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn coerce_map(value: Option<&Value>) -> Map<String, Value> {
    value
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn coerce_images(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_string).collect(),
        Some(single @ Value::String(_)) => coerce_string(single).into_iter().collect(),
        _ => Vec::new(),
    }
}
