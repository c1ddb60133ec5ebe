//! Declarative prompt templates.
//!
//! A template is a system persona plus a user body, both of which may hold
//! `{field}` placeholders. Placeholders and declared fields must match exactly; that
//! is checked once at startup through [`validate_all`], so rendering itself
//! can never fail.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use research_llm::Message;
use thiserror::Error;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("Failed to compile placeholder regex");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template '{template}' references undeclared field '{field}'")]
    UndeclaredField { template: String, field: String },

    #[error("template '{template}' declares field '{field}' but never uses it")]
    UnusedField { template: String, field: String },
}

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub system: &'static str,
    pub body: &'static str,
    pub fields: &'static [&'static str],
}

impl PromptTemplate {
    pub fn validate(&self) -> Result<(), TemplateError> {
        let declared: BTreeSet<&str> = self.fields.iter().copied().collect();
        let used: BTreeSet<&str> = [self.system, self.body]
            .into_iter()
            .flat_map(|text| PLACEHOLDER.captures_iter(text))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(field) = used.difference(&declared).next() {
            return Err(TemplateError::UndeclaredField {
                template: self.id.to_string(),
                field: field.to_string(),
            });
        }
        if let Some(field) = declared.difference(&used).next() {
            return Err(TemplateError::UnusedField {
                template: self.id.to_string(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    /// Substitute `fields` verbatim. Declared fields the caller did not
    /// supply render as empty text.
    pub fn render(&self, fields: &PromptFields) -> Vec<Message> {
        let fill = |text: &str| {
            PLACEHOLDER
                .replace_all(text, |caps: &Captures| {
                    fields.get(&caps[1]).unwrap_or_default().to_string()
                })
                .trim()
                .to_string()
        };

        vec![Message::system(fill(self.system)), Message::user(fill(self.body))]
    }
}

/// Fill-in values for one render. Values are taken as already formatted
/// text; numbers and pre-serialized JSON go through [`Display`].
#[derive(Debug, Clone, Default)]
pub struct PromptFields {
    values: HashMap<&'static str, String>,
}

impl PromptFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl Display) -> Self {
        self.values.insert(name, value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Every template used by the capability modules.
pub fn registry() -> Vec<&'static PromptTemplate> {
    let mut all = Vec::new();
    all.extend_from_slice(crate::citation::TEMPLATES);
    all.extend_from_slice(crate::literature::TEMPLATES);
    all.extend_from_slice(crate::collaboration::TEMPLATES);
    all.extend_from_slice(crate::extraction::TEMPLATES);
    all.extend_from_slice(crate::proposal::TEMPLATES);
    all
}

/// Check every registered template; the first mismatch wins.
pub fn validate_all() -> Result<usize, TemplateError> {
    let templates = registry();
    for template in &templates {
        template.validate()?;
    }
    Ok(templates.len())
}
