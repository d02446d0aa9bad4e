//! Typed recording helpers for known producers
//!
//! Agents, the LLM client and the database layer call these instead of
//! formatting metric names themselves.

use serde_json::json;

use crate::monitor::PerformanceMonitor;
use crate::types::{Metadata, MetricType};

/// Canonical metric names
pub mod names {
    pub const CPU_USAGE: &str = "cpu_usage";
    pub const MEMORY_USAGE: &str = "memory_usage";
    pub const DISK_USAGE: &str = "disk_usage";
    pub const AGENT_EXECUTION_TIME: &str = "agent_execution_time";
    pub const LLM_RESPONSE_TIME: &str = "llm_response_time";

    /// Per-agent execution time series
    pub fn agent_execution(agent: &str) -> String {
        format!("agent_execution_{}", agent)
    }

    /// Per-model token usage series
    pub fn llm_tokens(model: &str) -> String {
        format!("llm_tokens_{}", model)
    }

    /// Per-query-type duration series
    pub fn db_query(query_type: &str) -> String {
        format!("db_query_{}", query_type)
    }
}

const SECONDS: &str = "seconds";

impl PerformanceMonitor {
    /// Record an agent run under its own series and the aggregate series
    pub fn record_agent_execution(&self, agent: &str, execution_secs: f64, success: bool) {
        let mut metadata = Metadata::new();
        metadata.insert("agent".to_string(), json!(agent));
        metadata.insert("success".to_string(), json!(success));

        self.record(
            MetricType::AgentExecution,
            &names::agent_execution(agent),
            execution_secs,
            Some(SECONDS),
            Some(metadata.clone()),
        );
        self.record(
            MetricType::AgentExecution,
            names::AGENT_EXECUTION_TIME,
            execution_secs,
            Some(SECONDS),
            Some(metadata),
        );
    }

    /// Record an LLM round trip and, when known, its token usage
    pub fn record_llm_request(&self, model: &str, response_secs: f64, tokens_used: Option<u64>) {
        let mut metadata = Metadata::new();
        metadata.insert("model".to_string(), json!(model));
        metadata.insert("tokens".to_string(), json!(tokens_used));

        self.record(
            MetricType::LlmResponse,
            names::LLM_RESPONSE_TIME,
            response_secs,
            Some(SECONDS),
            Some(metadata),
        );

        if let Some(tokens) = tokens_used {
            let mut metadata = Metadata::new();
            metadata.insert("model".to_string(), json!(model));

            self.record(
                MetricType::LlmResponse,
                &names::llm_tokens(model),
                tokens as f64,
                Some("tokens"),
                Some(metadata),
            );
        }
    }

    /// Record a database query duration by query type
    pub fn record_db_query(&self, query_type: &str, duration_secs: f64) {
        let mut metadata = Metadata::new();
        metadata.insert("query_type".to_string(), json!(query_type));

        self.record(
            MetricType::DatabaseQuery,
            &names::db_query(query_type),
            duration_secs,
            Some(SECONDS),
            Some(metadata),
        );
    }
}
