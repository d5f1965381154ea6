use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const URL_PLACEHOLDER: &str = "{{url}}";
pub const CONTENT_PLACEHOLDER: &str = "{{content}}";

const BUILTIN_NAME: &str = "product@1.0.0";
const BUILTIN_BODY: &str = include_str!("../templates/product/1.0.0.txt");

/// A versioned prompt template with `{{url}}` and `{{content}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    body: String,
}

impl PromptTemplate {
    /// Build a template, rejecting bodies that lack either placeholder.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Result<Self, AppError> {
        let name = name.into();
        let body = body.into();
        for placeholder in [URL_PLACEHOLDER, CONTENT_PLACEHOLDER] {
            if !body.contains(placeholder) {
                return Err(AppError::ConfigError(format!(
                    "Prompt template {name} is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { name, body })
    }

    /// The product extraction template compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            name: BUILTIN_NAME.to_string(),
            body: BUILTIN_BODY.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute the placeholders in a single left-to-right pass.
    ///
    /// Substituted text is never scanned again, so a page containing
    /// `{{url}}` is embedded verbatim.
    pub fn render(&self, url: &str, content: &str) -> String {
        let mut out = String::with_capacity(self.body.len() + url.len() + content.len());
        let mut rest = self.body.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(URL_PLACEHOLDER) {
                out.push_str(url);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTENT_PLACEHOLDER) {
                out.push_str(content);
                rest = after;
            } else {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

const TEMPLATE_EXTENSION: &str = "txt";
const REGISTRY_FILE: &str = "registry.json";
const LATEST: &str = "latest";

/// Loads prompt templates by reference.
///
/// A reference is either a path to a template file or `name@version`, read
/// from `{templates_dir}/{name}/{version}.txt`. `name@latest` looks the
/// version up in `{templates_dir}/registry.json`.
pub struct TemplateResolver {
    templates_dir: PathBuf,
}

impl TemplateResolver {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn resolve(&self, reference: &str) -> Result<PromptTemplate, AppError> {
        let file = Path::new(reference);
        if file.is_file() {
            let name = file
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("custom");
            return load(file, name.to_string());
        }

        let (name, version) = parse_versioned(reference)?;
        let version = if version == LATEST {
            self.latest_version(name)?
        } else {
            version.to_string()
        };

        let path = self
            .templates_dir
            .join(name)
            .join(format!("{version}.{TEMPLATE_EXTENSION}"));
        load(&path, format!("{name}@{version}"))
    }

    fn latest_version(&self, name: &str) -> Result<String, AppError> {
        let path = self.templates_dir.join(REGISTRY_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut registry: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(format!("Invalid template registry {}: {e}", path.display()))
        })?;

        let version = registry.remove(name).ok_or_else(|| {
            AppError::ConfigError(format!("No latest version registered for prompt template {name}"))
        })?;
        check_component(&version, name)?;
        Ok(version)
    }
}

/// Split `name@version`, keeping both parts inside the templates directory.
fn parse_versioned(reference: &str) -> Result<(&str, &str), AppError> {
    let Some((name, version)) = reference.split_once('@') else {
        return Err(AppError::ConfigError(format!(
            "Prompt template not found: {reference} (expected a file or name@version)"
        )));
    };
    if name.is_empty() || version.is_empty() {
        return Err(AppError::ConfigError(format!(
            "Prompt template must be in the form name@version, got: {reference}"
        )));
    }
    check_component(name, reference)?;
    check_component(version, reference)?;
    Ok((name, version))
}

fn check_component(part: &str, reference: &str) -> Result<(), AppError> {
    if part.contains(['/', '\\']) || part.contains("..") {
        return Err(AppError::ConfigError(format!(
            "Prompt template reference {reference} must not contain path separators"
        )));
    }
    Ok(())
}

fn load(path: &Path, name: String) -> Result<PromptTemplate, AppError> {
    match std::fs::read_to_string(path) {
        Ok(body) => PromptTemplate::new(name, body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::ConfigError(format!(
            "Prompt template not found: {name} ({})",
            path.display()
        ))),
        Err(e) => Err(AppError::ConfigError(format!(
            "Failed to read prompt template {name} ({}): {e}",
            path.display()
        ))),
    }
}
