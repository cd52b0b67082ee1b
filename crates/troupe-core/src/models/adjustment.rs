//! Reasoned suggestions for user-requested plan changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, Level};
use crate::error::ReplyError;

/// The concrete change proposed for an adjustment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedChange {
    /// e.g. `direct` or `alternative`
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Replacement mode representations, when the change is feasible as asked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_plan: Option<Value>,
}

/// Feasibility judgment for a user's requested change to a plan.
///
/// Suggestions are advisory: recording one bumps the plan version and
/// appends to its audit trail but never alters status or modes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentSuggestion {
    /// How the request was understood
    pub understood: String,
    pub feasibility: Level,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestion: SuggestedChange,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

impl AdjustmentSuggestion {
    pub fn from_reply(reply: &Value) -> Result<Self, ReplyError> {
        if !reply.is_object() {
            return Err(ReplyError::MalformedSuggestion {
                reason: "reply must be an object".to_string(),
            });
        }
        serde_json::from_value(reply.clone()).map_err(|e| ReplyError::MalformedSuggestion {
            reason: e.to_string(),
        })
    }

    /// True when the change can be applied without risk.
    pub fn is_feasible(&self) -> bool {
        self.feasibility.is_high()
    }
}
