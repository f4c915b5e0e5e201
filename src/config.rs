//! PromptGate configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main PromptGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptgateConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pipeline orchestration configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Redaction pattern configuration
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Policy oracle configuration
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Audit trail configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl PromptgateConfig {
    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Load configuration for a command invocation.
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location is read when the file is there (`init` writes it), and
    /// built-in defaults apply otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit, &default_config_path()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Pick the configuration file to read. An explicit path always wins, even
/// when missing; a mistyped `--config` is an error, not a fallback.
fn resolve_config_path(explicit: Option<&Path>, default_path: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if default_path.exists() => Some(default_path.to_path_buf()),
        None => None,
    }
}

/// Default configuration file path (~/.promptgate/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".promptgate")
        .join("config.toml")
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS (empty = allow any)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

/// Pipeline orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-stage timeout in seconds for redaction and policy calls
    pub stage_timeout_secs: u64,

    /// Maximum accepted prompt length in characters
    pub max_prompt_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 10,
            max_prompt_chars: 32768,
        }
    }
}

/// Redaction pattern configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Patterns applied in order during the redaction stage
    pub patterns: Vec<RedactionPattern>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            patterns: default_redaction_patterns(),
        }
    }
}

/// A single redaction pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionPattern {
    /// Pattern name, reported as the matched PII category
    pub name: String,

    /// Regular expression to match
    pub pattern: String,

    /// Literal replacement token
    pub replacement: String,
}

/// Built-in redaction pattern set
pub fn default_redaction_patterns() -> Vec<RedactionPattern> {
    vec![
        RedactionPattern {
            name: "email".to_string(),
            pattern: r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(),
            replacement: "[REDACTED_EMAIL]".to_string(),
        },
        RedactionPattern {
            name: "phone".to_string(),
            pattern: r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b".to_string(),
            replacement: "[REDACTED_PHONE]".to_string(),
        },
        // Placeholder person pattern; deployments swap in a real NER feed.
        RedactionPattern {
            name: "name".to_string(),
            pattern: r"(?i)\bJohn Doe\b".to_string(),
            replacement: "[REDACTED_NAME]".to_string(),
        },
        RedactionPattern {
            name: "street_address".to_string(),
            pattern: r"(?i)\b\d{1,5}\s+[A-Za-z\s]+(?:St|Street|Ave|Avenue|Rd|Road|Blvd|Boulevard)\b"
                .to_string(),
            replacement: "[REDACTED_ADDRESS]".to_string(),
        },
        RedactionPattern {
            name: "invoice_number".to_string(),
            pattern: r"(?i)\bINV-\d{3,}\b".to_string(),
            replacement: "[REDACTED_INVOICE]".to_string(),
        },
    ]
}

/// Policy oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Oracle backend to use
    pub mode: PolicyMode,

    /// Endpoint for the `http` oracle
    pub endpoint: Option<String>,

    /// Rules for the `rule` oracle
    pub rules: Vec<PolicyRuleConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Rule,
            endpoint: None,
            rules: default_policy_rules(),
        }
    }
}

/// Policy oracle backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Local keyword rules (default)
    #[default]
    Rule,

    /// External compliance service
    Http,
}

/// A single keyword policy rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRuleConfig {
    /// Rule name
    pub name: String,

    /// Keywords that must all appear for the rule to fire
    pub keywords: Vec<String>,

    /// Regulation citation reported when the rule fires
    pub citation: String,

    /// Rationale reported when the rule fires
    pub rationale: String,
}

/// Built-in GDPR keyword rules
pub fn default_policy_rules() -> Vec<PolicyRuleConfig> {
    vec![
        PolicyRuleConfig {
            name: "marketing_consent".to_string(),
            keywords: vec!["marketing".to_string(), "german".to_string()],
            citation: "GDPR Article 6".to_string(),
            rationale: "Processing personal data for marketing purposes requires explicit \
                        consent under GDPR Article 6."
                .to_string(),
        },
        PolicyRuleConfig {
            name: "data_minimization".to_string(),
            keywords: vec!["export".to_string(), "customer".to_string()],
            citation: "GDPR Article 5".to_string(),
            rationale: "Data minimization principle violated - bulk export of customer data \
                        not justified."
                .to_string(),
        },
    ]
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Sink backend to use
    pub mode: AuditMode,

    /// Directory for the `file` sink
    pub dir: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            mode: AuditMode::File,
            dir: default_audit_dir(),
        }
    }
}

/// Audit sink backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// JSONL files, one per transaction (default)
    #[default]
    File,

    /// In-memory only, lost on restart
    Memory,
}

/// Default audit directory (~/.promptgate/audit/)
pub fn default_audit_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".promptgate")
        .join("audit")
}
