//! Typed prompt templates.
//!
//! Goals, task descriptions and expected outputs are written with `{name}` placeholders.
//! A [`Template`] is parsed once, against the list of parameters the caller declares, so a
//! typo like `{topc}` is rejected while the pipeline is being assembled instead of being
//! sent verbatim to the model.
//!
//! Only `{identifier}` sequences are placeholders. Any other brace (JSON snippets, `{}`) is
//! kept as literal text, and `{{` / `}}` escape a single brace.
//!
//! ```
//! use agentcrew::template::{Template, TemplateParams};
//!
//! let goal = Template::parse("Find reliable sources about {topic}", &["topic"]).unwrap();
//! let params = TemplateParams::new().with("topic", "clima");
//! assert_eq!(goal.render(&params).unwrap(), "Find reliable sources about clima");
//!
//! assert!(Template::parse("Write about {subject}", &["topic"]).is_err());
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Name of the parameter every pipeline template may use.
pub const TOPIC: &str = "topic";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Errors raised while parsing or rendering a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a parameter that was not declared.
    UndeclaredParameter { template: String, parameter: String },
    /// `render` was called without a value for a parameter the template uses.
    MissingValue(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndeclaredParameter {
                template,
                parameter,
            } => write!(
                f,
                "Template references undeclared parameter '{{{}}}': {}",
                parameter, template
            ),
            TemplateError::MissingValue(name) => {
                write!(f, "No value supplied for template parameter '{}'", name)
            }
        }
    }
}

impl Error for TemplateError {}

/// Named values substituted into a [`Template`].
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    values: HashMap<String, String>,
}

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for the common case of a single `{topic}` value.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self::new().with(TOPIC, topic)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A pre-parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`, rejecting placeholders that are not in `declared`.
    pub fn parse(source: impl Into<String>, declared: &[&str]) -> Result<Self, TemplateError> {
        let source = source.into();
        let segments = split_segments(&source);
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if !declared.contains(&name.as_str()) {
                    return Err(TemplateError::UndeclaredParameter {
                        template: source.clone(),
                        parameter: name.clone(),
                    });
                }
            }
        }
        Ok(Self { source, segments })
    }

    /// Parse a template that may only use `{topic}`.
    pub fn topic(source: impl Into<String>) -> Result<Self, TemplateError> {
        Self::parse(source, &[TOPIC])
    }

    /// The text the template was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of the parameters this template uses, in order of first appearance.
    pub fn parameters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Param(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn render(&self, params: &TemplateParams) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            literal.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(close) = tail.find('}') {
                let name = &tail[1..close];
                if is_identifier(name) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                    rest = &tail[close + 1..];
                    continue;
                }
            }
        }

        literal.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
