//! Regex-based redactor
//!
//! Compiles the configured pattern set once and applies each pattern in
//! order, replacing matches with the pattern's replacement token. Patterns
//! are applied against the progressively sanitized text, so an earlier
//! pattern's replacement is never re-matched by a later one.

use crate::config::{RedactionConfig, RedactionPattern};
use crate::error::{Error, Result};
use crate::pipeline::types::RedactionOutcome;
use crate::redaction::Redactor;
use async_trait::async_trait;
use regex::{NoExpand, Regex};

/// A redaction pattern with its compiled regex
#[derive(Debug, Clone)]
struct CompiledPattern {
    name: String,
    regex: Regex,
    replacement: String,
}

/// Redactor backed by a compiled regex pattern set
#[derive(Debug, Clone)]
pub struct PatternRedactor {
    patterns: Vec<CompiledPattern>,
}

impl PatternRedactor {
    /// Compile the configured pattern set. Fails on an invalid regex.
    pub fn from_config(config: &RedactionConfig) -> Result<Self> {
        Self::with_patterns(&config.patterns)
    }

    pub fn with_patterns(patterns: &[RedactionPattern]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(&p.pattern).map_err(|e| {
                    Error::Config(format!("invalid redaction pattern '{}': {}", p.name, e))
                })?;
                Ok(CompiledPattern {
                    name: p.name.clone(),
                    regex,
                    replacement: p.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns: compiled })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[async_trait]
impl Redactor for PatternRedactor {
    async fn redact(&self, text: &str) -> Result<RedactionOutcome> {
        let mut sanitized = text.to_string();
        let mut matched_patterns = Vec::new();

        for pattern in &self.patterns {
            if pattern.regex.is_match(&sanitized) {
                matched_patterns.push(pattern.name.clone());
                // Replacement tokens are literal text, not capture templates.
                sanitized = pattern
                    .regex
                    .replace_all(&sanitized, NoExpand(&pattern.replacement))
                    .into_owned();
            }
        }

        Ok(RedactionOutcome {
            sanitized_text: sanitized,
            matched_patterns,
        })
    }
}
