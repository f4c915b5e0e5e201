//! Supervisor orchestration
//!
//! Drives one prompt through the fixed stage order: receipt, redaction,
//! policy check, synthesis, audit summary. Stage boundaries are strict; the
//! policy oracle only ever sees the redacted text, and the synthesizer only
//! sees the recorded stage outputs.
//!
//! Collaborator failures never abort a transaction. A failed redactor
//! degrades to a placeholder prompt, a failed or timed-out oracle degrades
//! to the fail-closed non-compliant outcome, and audit writes are detached
//! entirely. Only invalid input (before any stage) or an internal fault
//! (with the partial trace attached) surface as errors.

use crate::audit::{AuditDispatcher, AuditEntry};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::pipeline::trace::TraceAccumulator;
use crate::pipeline::types::{
    PolicyOutcome, ProcessRequest, RedactionOutcome, Stage, StageRecord, Transaction,
};
use crate::pipeline::verdict;
use crate::policy::PolicyOracle;
use crate::redaction::Redactor;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Prompt used when the redactor is unavailable; policy evaluation must
/// never fall back to the raw text.
const REDACTION_PLACEHOLDER: &str = "[REDACTION UNAVAILABLE]";

/// Pipeline orchestrator
pub struct Supervisor {
    redactor: Arc<dyn Redactor>,
    oracle: Arc<dyn PolicyOracle>,
    audit: AuditDispatcher,
    stage_timeout: Duration,
    max_prompt_chars: usize,
}

impl Supervisor {
    pub fn new(
        redactor: Arc<dyn Redactor>,
        oracle: Arc<dyn PolicyOracle>,
        audit: AuditDispatcher,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            redactor,
            oracle,
            audit,
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
            max_prompt_chars: config.max_prompt_chars,
        }
    }

    /// Run one prompt through the full pipeline.
    ///
    /// Validation failures surface as [`Error::Input`] before any stage
    /// runs, so a rejected prompt leaves no trace and no audit entries.
    /// Failures after the trace has started surface as
    /// [`Error::Transaction`] carrying the partial trace.
    pub async fn process(&self, request: ProcessRequest) -> Result<Transaction> {
        validate_prompt(&request.prompt, self.max_prompt_chars)?;

        let transaction_id = request
            .transaction_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let trace = TraceAccumulator::new();
        match self.run(&request, &transaction_id, &trace).await {
            Ok(transaction) => {
                tracing::info!(
                    "Transaction {} completed: {} (risk {:.1})",
                    transaction.id,
                    transaction.disposition,
                    transaction.risk_score
                );
                Ok(transaction)
            }
            Err(e) => {
                tracing::error!("Transaction {} failed: {}", transaction_id, e);
                Err(Error::Transaction {
                    message: format!("internal stage failure in transaction {}", transaction_id),
                    trace: trace.snapshot().await,
                })
            }
        }
    }

    async fn run(
        &self,
        request: &ProcessRequest,
        transaction_id: &str,
        trace: &TraceAccumulator,
    ) -> Result<Transaction> {
        let received_at = Utc::now();

        // Stage 1: receipt
        let record = trace
            .append(
                Stage::PromptReceived,
                json!({"prompt": request.prompt, "callerId": request.caller_id}),
                json!({"accepted": true}),
                "Received",
            )
            .await;
        self.dispatch_audit(transaction_id, &request.caller_id, &record);

        // Stage 2: redaction, completed before any policy evaluation
        let (redaction, redaction_degraded) = match self.call_redactor(&request.prompt).await {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                tracing::warn!("Redaction degraded for transaction {}: {}", transaction_id, e);
                (
                    RedactionOutcome {
                        sanitized_text: REDACTION_PLACEHOLDER.to_string(),
                        matched_patterns: Vec::new(),
                    },
                    Some(e.to_string()),
                )
            }
        };
        let redaction_occurred = redaction.was_redacted() || redaction_degraded.is_some();

        let redaction_decision = if redaction_degraded.is_some() {
            "Redaction unavailable"
        } else if redaction.was_redacted() {
            "Redacted PII"
        } else {
            "No PII detected"
        };
        let mut redaction_output = json!({
            "sanitizedPrompt": redaction.sanitized_text,
            "matchedPatterns": redaction.matched_patterns,
        });
        if let Some(reason) = &redaction_degraded {
            if let Some(obj) = redaction_output.as_object_mut() {
                obj.insert("degraded".to_string(), json!(reason));
            }
        }
        let record = trace
            .append(
                Stage::Redaction,
                json!({"prompt": request.prompt}),
                redaction_output,
                redaction_decision,
            )
            .await;
        self.dispatch_audit(transaction_id, &request.caller_id, &record);

        let processed_prompt = redaction.sanitized_text.clone();

        // Stage 3: policy check on the sanitized text only
        let (policy, policy_degraded) = match self.call_oracle(&processed_prompt).await {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                tracing::warn!(
                    "Policy check degraded for transaction {}: {}",
                    transaction_id,
                    e
                );
                (PolicyOutcome::unavailable(), Some(e.to_string()))
            }
        };

        let policy_decision = if policy_degraded.is_some() {
            "Policy check unavailable"
        } else if policy.compliant {
            "Compliant"
        } else {
            "Non-compliant"
        };
        let mut policy_output = serde_json::to_value(&policy)?;
        if let Some(reason) = &policy_degraded {
            if let Some(obj) = policy_output.as_object_mut() {
                obj.insert("degraded".to_string(), json!(reason));
            }
        }
        let record = trace
            .append(
                Stage::PolicyCheck,
                json!({"prompt": processed_prompt}),
                policy_output,
                policy_decision,
            )
            .await;
        self.dispatch_audit(transaction_id, &request.caller_id, &record);

        // Stage 4: synthesis over the recorded outcomes
        let verdict = verdict::synthesize(redaction_occurred, &redaction.matched_patterns, &policy);
        let record = trace
            .append(
                Stage::Synthesis,
                json!({
                    "redactionOccurred": redaction_occurred,
                    "compliant": policy.compliant,
                }),
                serde_json::to_value(&verdict)?,
                verdict.disposition.decision_label(),
            )
            .await;
        self.dispatch_audit(transaction_id, &request.caller_id, &record);

        // Stage 5: terminal audit summary
        let stages_recorded = trace.len().await;
        let record = trace
            .append(
                Stage::AuditLogged,
                json!({"stagesRecorded": stages_recorded}),
                json!({
                    "status": "completed",
                    "disposition": verdict.disposition,
                    "riskScore": verdict.risk_score,
                }),
                "Logged",
            )
            .await;
        self.dispatch_audit(transaction_id, &request.caller_id, &record);

        Ok(Transaction {
            id: transaction_id.to_string(),
            caller_id: request.caller_id.clone(),
            original_prompt: request.prompt.clone(),
            processed_prompt,
            disposition: verdict.disposition,
            risk_score: verdict.risk_score,
            advisory_message: verdict.advisory_message,
            received_at,
            completed_at: Utc::now(),
            trace: trace.snapshot().await,
        })
    }

    async fn call_redactor(&self, text: &str) -> Result<RedactionOutcome> {
        match timeout(self.stage_timeout, self.redactor.redact(text)).await {
            Ok(result) => result,
            Err(_) => Err(Error::degraded(Stage::Redaction, "stage timed out")),
        }
    }

    async fn call_oracle(&self, text: &str) -> Result<PolicyOutcome> {
        match timeout(self.stage_timeout, self.oracle.check(text)).await {
            Ok(result) => result,
            Err(_) => Err(Error::degraded(Stage::PolicyCheck, "stage timed out")),
        }
    }

    fn dispatch_audit(&self, transaction_id: &str, caller_id: &str, record: &StageRecord) {
        self.audit
            .dispatch(AuditEntry::from_record(transaction_id, caller_id, record));
    }
}

fn validate_prompt(prompt: &str, max_chars: usize) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::Input("prompt must not be empty".to_string()));
    }
    if prompt.chars().count() > max_chars {
        return Err(Error::Input(format!(
            "prompt exceeds {} characters",
            max_chars
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditQuery, AuditSink, MemoryAuditSink};
    use crate::config::{default_policy_rules, default_redaction_patterns};
    use crate::pipeline::types::{Citation, Disposition};
    use crate::pipeline::verdict::{RISK_MODIFY, RISK_PASS};
    use crate::policy::RulePolicyOracle;
    use crate::redaction::PatternRedactor;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticOracle(PolicyOutcome);

    #[async_trait]
    impl PolicyOracle for StaticOracle {
        async fn check(&self, _text: &str) -> Result<PolicyOutcome> {
            Ok(self.0.clone())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl PolicyOracle for FailingOracle {
        async fn check(&self, _text: &str) -> Result<PolicyOutcome> {
            Err(Error::degraded(Stage::PolicyCheck, "oracle offline"))
        }
    }

    struct PendingOracle;

    #[async_trait]
    impl PolicyOracle for PendingOracle {
        async fn check(&self, _text: &str) -> Result<PolicyOutcome> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    struct CapturingOracle {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PolicyOracle for CapturingOracle {
        async fn check(&self, text: &str) -> Result<PolicyOutcome> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(PolicyOutcome {
                compliant: true,
                rationale: "No policy violations detected.".to_string(),
                citations: vec![],
            })
        }
    }

    struct FailingRedactor;

    #[async_trait]
    impl Redactor for FailingRedactor {
        async fn redact(&self, _text: &str) -> Result<RedactionOutcome> {
            Err(Error::degraded(Stage::Redaction, "engine offline"))
        }
    }

    struct HangingSink;

    #[async_trait]
    impl AuditSink for HangingSink {
        async fn append(&self, _entry: AuditEntry) -> Result<()> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn make_supervisor(oracle: Arc<dyn PolicyOracle>, sink: Arc<MemoryAuditSink>) -> Supervisor {
        let redactor =
            PatternRedactor::with_patterns(&default_redaction_patterns()).unwrap();
        Supervisor::new(
            Arc::new(redactor),
            oracle,
            AuditDispatcher::new(sink),
            &PipelineConfig::default(),
        )
    }

    fn rule_oracle() -> Arc<dyn PolicyOracle> {
        Arc::new(RulePolicyOracle::with_rules(default_policy_rules()))
    }

    fn request(prompt: &str, caller_id: &str) -> ProcessRequest {
        ProcessRequest {
            prompt: prompt.to_string(),
            caller_id: caller_id.to_string(),
            transaction_id: None,
        }
    }

    fn stages(transaction: &Transaction) -> Vec<Stage> {
        transaction.trace.iter().map(|r| r.stage).collect()
    }

    #[tokio::test]
    async fn test_clean_prompt_passes() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink);

        let tx = supervisor
            .process(request("Summarize the quarterly results", "agent-1"))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Pass);
        assert_eq!(tx.risk_score, RISK_PASS);
        assert_eq!(tx.processed_prompt, tx.original_prompt);
        assert_eq!(tx.trace.len(), 5);
        assert!(tx.advisory_message.contains("processed successfully"));
    }

    #[tokio::test]
    async fn test_redacted_prompt_modified_with_full_trace() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink);

        let tx = supervisor
            .process(request(
                "Email John Doe at 123 Main St about INV-12345",
                "agent-1",
            ))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Modify);
        assert_eq!(tx.risk_score, RISK_MODIFY);
        assert_eq!(
            stages(&tx),
            vec![
                Stage::PromptReceived,
                Stage::Redaction,
                Stage::PolicyCheck,
                Stage::Synthesis,
                Stage::AuditLogged,
            ]
        );

        assert!(tx.processed_prompt.contains("[REDACTED_NAME]"));
        assert!(tx.processed_prompt.contains("[REDACTED_ADDRESS]"));
        assert!(tx.processed_prompt.contains("[REDACTED_INVOICE]"));
        assert!(!tx.processed_prompt.contains("John Doe"));

        // The advisory names the matched categories.
        assert!(tx.advisory_message.contains("name"));
        assert!(tx.advisory_message.contains("street_address"));
        assert!(tx.advisory_message.contains("invoice_number"));

        // The policy stage received exactly what the redaction stage produced.
        assert_eq!(
            tx.trace[2].input["prompt"],
            tx.trace[1].output["sanitizedPrompt"]
        );

        // Trace timestamps never step backwards.
        for pair in tx.trace.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_non_compliant_prompt_blocked_with_citation() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink);

        let tx = supervisor
            .process(request(
                "Draft a marketing email for our German subscribers",
                "agent-1",
            ))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Block);
        assert!(tx.advisory_message.contains("GDPR Article 6"));
        assert!((tx.risk_score - 8.5).abs() < 1e-9);
        assert_eq!(tx.trace[3].decision, "Blocked");
        // No PII in this prompt, so the text passes through untouched.
        assert_eq!(tx.processed_prompt, tx.original_prompt);
    }

    #[tokio::test]
    async fn test_block_dominates_when_redacted_and_non_compliant() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink);

        let tx = supervisor
            .process(request("Export customer emails for John Doe", "agent-1"))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Block);
        assert!(tx.processed_prompt.contains("[REDACTED_NAME]"));
        assert_eq!(tx.trace[1].decision, "Redacted PII");
        assert_eq!(tx.trace[2].decision, "Non-compliant");
    }

    #[tokio::test]
    async fn test_failing_oracle_fails_closed() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(Arc::new(FailingOracle), sink);

        let tx = supervisor
            .process(request("Summarize the quarterly results", "agent-1"))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Block);
        assert!(tx.advisory_message.contains("policy check unavailable"));
        assert_eq!(tx.trace[2].decision, "Policy check unavailable");
        assert!(tx.trace[2].output.get("degraded").is_some());
        // The transaction still completes with the full trace.
        assert_eq!(tx.trace.len(), 5);
    }

    #[tokio::test]
    async fn test_oracle_timeout_fails_closed() {
        let sink = Arc::new(MemoryAuditSink::new());
        let redactor =
            PatternRedactor::with_patterns(&default_redaction_patterns()).unwrap();
        // A zero budget expires on the first poll, so the oracle that never
        // answers is cut off without slowing the test down.
        let supervisor = Supervisor::new(
            Arc::new(redactor),
            Arc::new(PendingOracle),
            AuditDispatcher::new(sink),
            &PipelineConfig {
                stage_timeout_secs: 0,
                max_prompt_chars: 32768,
            },
        );

        let tx = supervisor
            .process(request("Summarize the quarterly results", "agent-1"))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Block);
        assert_eq!(tx.trace[2].decision, "Policy check unavailable");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_any_stage() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink.clone());

        let err = supervisor.process(request("", "agent-1")).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        let err = supervisor
            .process(request("   \n\t", "agent-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        // No stage ran, so nothing was dispatched to the audit sink.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_oversized_prompt_rejected() {
        let sink = Arc::new(MemoryAuditSink::new());
        let redactor =
            PatternRedactor::with_patterns(&default_redaction_patterns()).unwrap();
        let supervisor = Supervisor::new(
            Arc::new(redactor),
            rule_oracle(),
            AuditDispatcher::new(sink),
            &PipelineConfig {
                stage_timeout_secs: 10,
                max_prompt_chars: 16,
            },
        );

        let err = supervisor
            .process(request("this prompt is longer than sixteen characters", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(err.to_string().contains("16"));
    }

    #[tokio::test]
    async fn test_policy_never_sees_raw_pii() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let oracle = Arc::new(CapturingOracle { seen: seen.clone() });
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(oracle, sink);

        supervisor
            .process(request("Email John Doe about the contract", "agent-1"))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("[REDACTED_NAME]"));
        assert!(!seen[0].contains("John Doe"));
    }

    #[tokio::test]
    async fn test_degraded_redactor_uses_placeholder() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = Supervisor::new(
            Arc::new(FailingRedactor),
            rule_oracle(),
            AuditDispatcher::new(sink),
            &PipelineConfig::default(),
        );

        let tx = supervisor
            .process(request("Email John Doe about the contract", "agent-1"))
            .await
            .unwrap();

        // A lost redactor counts as a redaction event, never a clean pass.
        assert_eq!(tx.disposition, Disposition::Modify);
        assert_eq!(tx.processed_prompt, REDACTION_PLACEHOLDER);
        assert_eq!(tx.trace[1].decision, "Redaction unavailable");
        assert!(tx.advisory_message.contains("unverified content"));
    }

    #[tokio::test]
    async fn test_caller_supplied_transaction_id() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink.clone());

        let mut req = request("Summarize the quarterly results", "agent-1");
        req.transaction_id = Some("tx-custom-7".to_string());

        let tx = supervisor.process(req).await.unwrap();
        assert_eq!(tx.id, "tx-custom-7");

        tokio::time::sleep(Duration::from_millis(50)).await;
        let trail = sink.entries_for_transaction("tx-custom-7").await;
        assert_eq!(trail.len(), 5);
    }

    #[tokio::test]
    async fn test_generated_transaction_ids_are_unique() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink);

        let a = supervisor
            .process(request("Summarize the quarterly results", "agent-1"))
            .await
            .unwrap();
        let b = supervisor
            .process(request("Summarize the quarterly results", "agent-1"))
            .await
            .unwrap();

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_audit_receives_all_five_stages() {
        let sink = Arc::new(MemoryAuditSink::new());
        let supervisor = make_supervisor(rule_oracle(), sink.clone());

        let tx = supervisor
            .process(request("Email John Doe about the contract", "agent-007"))
            .await
            .unwrap();

        // Give the detached writes a moment to complete
        tokio::time::sleep(Duration::from_millis(50)).await;

        let trail = sink.entries_for_transaction(&tx.id).await;
        assert_eq!(trail.len(), 5);
        assert_eq!(trail[0].stage, Stage::PromptReceived);
        assert_eq!(trail[4].stage, Stage::AuditLogged);
        assert!(trail.iter().all(|e| e.caller_id == "agent-007"));
    }

    #[tokio::test]
    async fn test_hanging_audit_sink_does_not_block_pipeline() {
        let redactor =
            PatternRedactor::with_patterns(&default_redaction_patterns()).unwrap();
        let supervisor = Supervisor::new(
            Arc::new(redactor),
            rule_oracle(),
            AuditDispatcher::new(Arc::new(HangingSink)),
            &PipelineConfig::default(),
        );

        let tx = timeout(
            Duration::from_secs(5),
            supervisor.process(request("Summarize the quarterly results", "agent-1")),
        )
        .await
        .expect("pipeline must not wait on the audit sink")
        .unwrap();

        assert_eq!(tx.disposition, Disposition::Pass);
        assert_eq!(tx.trace.len(), 5);
    }

    #[tokio::test]
    async fn test_static_oracle_citations_reach_synthesis() {
        let sink = Arc::new(MemoryAuditSink::new());
        let oracle = StaticOracle(PolicyOutcome {
            compliant: false,
            rationale: "Cross-border transfer requires safeguards under GDPR Article 46."
                .to_string(),
            citations: vec![
                Citation {
                    reference: "GDPR Article 46".to_string(),
                    excerpt: "transfers subject to appropriate safeguards".to_string(),
                },
                Citation {
                    reference: "GDPR Article 44".to_string(),
                    excerpt: "general principle for transfers".to_string(),
                },
            ],
        });
        let supervisor = make_supervisor(Arc::new(oracle), sink);

        let tx = supervisor
            .process(request("Move the records to the new region", "agent-1"))
            .await
            .unwrap();

        assert_eq!(tx.disposition, Disposition::Block);
        assert!(tx.advisory_message.contains("GDPR Article 46"));
        // Base block risk plus two citation steps.
        assert!((tx.risk_score - 8.8).abs() < 1e-9);
    }
}
