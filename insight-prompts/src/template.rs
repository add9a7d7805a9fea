//! Prompt templates with `{{variable}}` substitution.

use std::collections::HashMap;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template references a variable that was not supplied.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },
}

/// A prompt template with variable substitution.
///
/// Placeholders use `{{name}}` where `name` is made of ASCII letters, digits,
/// `_`, `-` or `.`. Any other brace sequence is copied through untouched, so
/// literal JSON can be written directly into a template. Rendering is a single
/// pass: substituted values are never scanned for further placeholders.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use insight_prompts::template::PromptTemplate;
///
/// let template = PromptTemplate::new("Return {\"name\": \"...\"} for {{subject}}.");
/// let vars = HashMap::from([("subject", "the event".to_owned())]);
///
/// let rendered = template.render_with(&vars).unwrap();
/// assert_eq!(rendered, "Return {\"name\": \"...\"} for the event.");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    /// Creates a template over the supplied text.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Renders the template, substituting every placeholder from `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if a placeholder has no value.
    pub fn render_with(&self, vars: &HashMap<&str, String>) -> TemplateResult<String> {
        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some((name, consumed)) = parse_placeholder(after) else {
                rendered.push_str("{{");
                rest = after;
                continue;
            };

            let value = vars.get(name).ok_or_else(|| TemplateError::MissingVariable {
                name: name.to_owned(),
            })?;
            rendered.push_str(value);
            rest = &after[consumed..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }

    /// Returns the raw template string.
    #[must_use]
    pub const fn template(&self) -> &'static str {
        self.template
    }
}

/// Parses the text following `{{`, returning the variable name and the number
/// of bytes up to and including the closing `}}`.
fn parse_placeholder(input: &str) -> Option<(&str, usize)> {
    let end = input.find("}}")?;
    let name = input[..end].trim();
    if name.is_empty() || !name.chars().all(is_variable_char) {
        return None;
    }
    Some((name, end + 2))
}

fn is_variable_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')
}
