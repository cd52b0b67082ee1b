//! Engine tunables.

use crate::{models::MIN_GOAL_CHARS, ports::ReasoningOptions};

/// Settings shared by the planning and execution services.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum goal length after trimming, in characters
    pub min_goal_chars: usize,
    /// Options for the capability-analysis call; low temperature keeps the
    /// reply shape stable
    pub analysis: ReasoningOptions,
    /// Options for the mode-generation call
    pub modes: ReasoningOptions,
    /// Options for the adjustment-suggestion call
    pub adjustment: ReasoningOptions,
    /// How many characters of an unparsable reply to keep for diagnostics
    pub raw_reply_prefix: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_goal_chars: MIN_GOAL_CHARS,
            analysis: ReasoningOptions {
                max_output_tokens: 1500,
                temperature: 0.3,
                ..ReasoningOptions::default()
            },
            modes: ReasoningOptions {
                max_output_tokens: 2500,
                temperature: 0.7,
                ..ReasoningOptions::default()
            },
            adjustment: ReasoningOptions {
                max_output_tokens: 1500,
                temperature: 0.5,
                ..ReasoningOptions::default()
            },
            raw_reply_prefix: 500,
        }
    }
}
