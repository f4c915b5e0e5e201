//! Keyword-rule policy oracle
//!
//! Evaluates the prompt against a configured rule list. A rule fires when
//! all of its keywords appear in the prompt (case-insensitive); every fired
//! rule contributes one citation, and a prompt with no fired rules is
//! compliant. Evaluation is local and deterministic, so this oracle never
//! fails or times out.

use crate::config::{PolicyConfig, PolicyRuleConfig};
use crate::error::Result;
use crate::pipeline::types::{Citation, PolicyOutcome};
use crate::policy::PolicyOracle;
use async_trait::async_trait;

/// Policy oracle backed by local keyword rules
#[derive(Debug, Clone)]
pub struct RulePolicyOracle {
    rules: Vec<PolicyRuleConfig>,
}

impl RulePolicyOracle {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            rules: config.rules.clone(),
        }
    }

    pub fn with_rules(rules: Vec<PolicyRuleConfig>) -> Self {
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn fired_rules(&self, text: &str) -> Vec<&PolicyRuleConfig> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| {
                !rule.keywords.is_empty()
                    && rule
                        .keywords
                        .iter()
                        .all(|k| lowered.contains(&k.to_lowercase()))
            })
            .collect()
    }
}

#[async_trait]
impl PolicyOracle for RulePolicyOracle {
    async fn check(&self, text: &str) -> Result<PolicyOutcome> {
        let fired = self.fired_rules(text);

        if fired.is_empty() {
            return Ok(PolicyOutcome {
                compliant: true,
                rationale: "No policy violations detected.".to_string(),
                citations: Vec::new(),
            });
        }

        let rationale = fired
            .iter()
            .map(|rule| rule.rationale.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let citations = fired
            .iter()
            .map(|rule| Citation {
                reference: rule.citation.clone(),
                excerpt: rule.rationale.clone(),
            })
            .collect();

        Ok(PolicyOutcome {
            compliant: false,
            rationale,
            citations,
        })
    }
}
