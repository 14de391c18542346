//! Prompt templates.
//!
//! A small closed-form template language, enough to turn a flow's validated
//! input into prompt text:
//!
//! - `{{path}}` / `{{{path}}}` interpolate a dotted field path
//! - `{{#each path}}...{{/each}}` iterates a list; `{{this}}` is the current
//!   item and `{{@index}}` its zero-based position
//! - `{{#if path == "literal"}}...{{else}}...{{/if}}` gates on equality with
//!   a string, number or boolean literal
//!
//! Blocks of the same kind do not nest. Missing fields render as empty text.
//!
//! ```
//! use mavuno_core::template::render;
//! use serde_json::json;
//!
//! let text = render(
//!     "{{#if variant == \"community\"}}Plan for {{familySize}} households.{{/if}}",
//!     &json!({ "variant": "community", "familySize": 40 }),
//! )
//! .unwrap();
//! assert_eq!(text, "Plan for 40 households.");
//! ```

mod error;
mod parse;
mod render;

use std::str::FromStr;

pub use error::TemplateError;
use serde_json::Value;

/// A parsed template node.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Each {
        path: String,
        body: Vec<Node>,
    },
    If {
        path: String,
        literal: Value,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A parsed, reusable prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses template source.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let nodes = parse::parse(source)?;
        Ok(Self { nodes })
    }

    /// Renders the template against a JSON context.
    ///
    /// Rendering never fails: missing or null fields produce empty text.
    pub fn render(&self, context: &Value) -> String {
        render::render(&self.nodes, context)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

/// Parses and renders `source` in one call.
pub fn render(source: &str, context: &Value) -> Result<String, TemplateError> {
    Ok(Template::parse(source)?.render(context))
}
