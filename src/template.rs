//! URI template compilation and variable extraction
//!
//! Resource bindings may declare a location template such as
//! `users/{userId}/posts/{postId}`. The template is compiled to a regex once
//! at construction time; at call time the concrete location is matched
//! positionally and the placeholder values extracted. Supports RFC 6570
//! level 1 simple expansion (`{var}`, no slashes) plus reserved expansion
//! (`{+var}`, slashes allowed).

use std::collections::HashMap;

use crate::error::{BindResult, BindingError};

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    pattern: regex::Regex,
    variables: Vec<String>,
}

impl UriTemplate {
    /// Compile a template, collecting its placeholder names in order.
    pub fn compile(template: impl Into<String>) -> BindResult<Self> {
        let template = template.into();
        let mut pattern = String::from("^");
        let mut variables = Vec::new();

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '{' {
                let is_reserved = chars.peek() == Some(&'+');
                if is_reserved {
                    chars.next();
                }

                let var_name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                if var_name.is_empty() {
                    return Err(BindingError::InvalidTemplate {
                        template,
                        reason: "empty placeholder".to_string(),
                    });
                }
                if variables.contains(&var_name) {
                    return Err(BindingError::InvalidTemplate {
                        template,
                        reason: format!("placeholder `{var_name}` appears more than once"),
                    });
                }
                variables.push(var_name);

                if is_reserved {
                    pattern.push_str("(.+)");
                } else {
                    pattern.push_str("([^/]+)");
                }
            } else {
                match c {
                    '.' | '+' | '*' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
                    | '\\' => {
                        pattern.push('\\');
                        pattern.push(c);
                    }
                    _ => pattern.push(c),
                }
            }
        }
        pattern.push('$');

        let pattern = regex::Regex::new(&pattern).map_err(|e| BindingError::InvalidTemplate {
            template: template.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template,
            pattern,
            variables,
        })
    }

    /// The original template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Match a concrete location and extract placeholder values.
    ///
    /// Returns `None` when the location does not have the template's shape.
    pub fn extract(&self, uri: &str) -> Option<HashMap<String, String>> {
        self.pattern.captures(uri).map(|caps| {
            self.variables
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    caps.get(i + 1)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect()
        })
    }

    /// Verify placeholders and named-argument parameters correspond 1:1.
    ///
    /// `argument_names` are the binding's declared named arguments.
    pub(crate) fn check_correspondence(&self, argument_names: &[&str]) -> BindResult<()> {
        let missing: Vec<&str> = self
            .variables
            .iter()
            .map(String::as_str)
            .filter(|v| !argument_names.contains(v))
            .collect();
        let unmatched: Vec<&str> = argument_names
            .iter()
            .copied()
            .filter(|a| !self.variables.iter().any(|v| v == a))
            .collect();

        if missing.is_empty() && unmatched.is_empty() {
            Ok(())
        } else {
            Err(BindingError::TemplateVariableMismatch {
                template: self.template.clone(),
                missing: missing.join(", "),
                unmatched: unmatched.join(", "),
            })
        }
    }
}
