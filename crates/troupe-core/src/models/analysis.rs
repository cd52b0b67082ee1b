//! Capability analysis value object.
//!
//! A [`CapabilityAnalysis`] is the judgment of whether a roster can meet a
//! goal. It is built from a reasoning reply, validated as a whole, and then
//! attached to a plan, replacing whatever analysis the plan held before.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, Level, WorkerSnapshot};
use crate::error::ReplyError;

/// A role the goal needs, as judged by the capability oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequiredRole {
    #[serde(alias = "typeId")]
    pub role_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Level,
}

/// A skill the roster lacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Level,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestion: String,
}

/// A role the roster lacks, with the cost of hiring it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleGap {
    #[serde(alias = "typeId")]
    pub role_id: String,
    /// Display name of the role, when the oracle provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cost: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Level>,
}

impl RoleGap {
    pub fn is_high_priority(&self) -> bool {
        self.priority.is_high() || self.severity.as_ref().is_some_and(Level::is_high)
    }
}

/// Hiring recommendation given when the roster falls short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HiringAdvice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String,
}

/// A caveat attached to an analysis. Oracles return either plain sentences
/// or objects carrying a severity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Warning {
    Detailed {
        message: String,
        #[serde(default, deserialize_with = "null_as_default")]
        severity: Level,
    },
    Note(String),
}

impl Warning {
    pub fn message(&self) -> &str {
        match self {
            Warning::Detailed { message, .. } => message,
            Warning::Note(message) => message,
        }
    }

    /// Plain-sentence warnings carry no severity and are never critical.
    pub fn is_critical(&self) -> bool {
        matches!(self, Warning::Detailed { severity, .. } if severity.is_high())
    }
}

/// Immutable snapshot judging whether a roster can meet a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityAnalysis {
    pub required_skills: Vec<String>,
    pub required_roles: Vec<RequiredRole>,
    /// Roster snapshot the judgment was made against
    pub current_workers: Vec<WorkerSnapshot>,
    pub skill_gaps: Vec<SkillGap>,
    pub role_gaps: Vec<RoleGap>,
    pub is_sufficient: bool,
    /// Oracle confidence, 0 to 100
    pub confidence_score: f64,
    pub hiring_advice: Option<HiringAdvice>,
    pub warnings: Vec<Warning>,
}

/// Shape of the oracle reply once the structural checks have passed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    required_skills: Vec<String>,
    required_roles: Vec<RequiredRole>,
    #[serde(default, deserialize_with = "null_as_default")]
    skill_gaps: Vec<SkillGap>,
    #[serde(default, deserialize_with = "null_as_default")]
    role_gaps: Vec<RoleGap>,
    is_sufficient: bool,
    confidence_score: f64,
    #[serde(default)]
    hiring_advice: Option<HiringAdvice>,
    #[serde(default, deserialize_with = "null_as_default")]
    warnings: Vec<Warning>,
}

impl CapabilityAnalysis {
    /// Builds an analysis from a parsed oracle reply.
    ///
    /// The reply is checked as a whole before any field is read, so the
    /// returned [`ReplyError::InvalidAnalysis`] lists every violation found
    /// rather than stopping at the first one.
    pub fn from_reply(reply: &Value, current_workers: Vec<WorkerSnapshot>) -> Result<Self, ReplyError> {
        let violations = Self::validate_reply(reply);
        if !violations.is_empty() {
            return Err(ReplyError::InvalidAnalysis { violations });
        }

        let parsed: AnalysisReply =
            serde_json::from_value(reply.clone()).map_err(|e| ReplyError::InvalidAnalysis {
                violations: vec![e.to_string()],
            })?;

        Ok(Self {
            required_skills: parsed.required_skills,
            required_roles: parsed.required_roles,
            current_workers,
            skill_gaps: parsed.skill_gaps,
            role_gaps: parsed.role_gaps,
            is_sufficient: parsed.is_sufficient,
            confidence_score: parsed.confidence_score,
            hiring_advice: parsed.hiring_advice,
            warnings: parsed.warnings,
        })
    }

    /// Structural checks on a raw reply. Returns every violation found.
    pub fn validate_reply(reply: &Value) -> Vec<String> {
        let Some(fields) = reply.as_object() else {
            return vec!["reply must be an object".to_string()];
        };

        let mut violations = Vec::new();

        if !fields.get("requiredSkills").is_some_and(Value::is_array) {
            violations.push("requiredSkills must be an array".to_string());
        }
        if !fields.get("requiredRoles").is_some_and(Value::is_array) {
            violations.push("requiredRoles must be an array".to_string());
        }
        if !fields.get("isSufficient").is_some_and(Value::is_boolean) {
            violations.push("isSufficient must be a boolean".to_string());
        }
        match fields.get("confidenceScore").and_then(Value::as_f64) {
            Some(score) if (0.0..=100.0).contains(&score) => {}
            _ => violations.push("confidenceScore must be a number between 0 and 100".to_string()),
        }

        violations
    }

    /// Sum of the hiring cost over all role gaps.
    pub fn total_hiring_cost(&self) -> f64 {
        self.role_gaps.iter().map(|gap| gap.cost).sum()
    }

    /// Role gaps whose priority or severity is high.
    pub fn high_priority_role_gaps(&self) -> Vec<&RoleGap> {
        self.role_gaps
            .iter()
            .filter(|gap| gap.is_high_priority())
            .collect()
    }

    /// Skill gaps whose severity is high.
    pub fn critical_skill_gaps(&self) -> Vec<&SkillGap> {
        self.skill_gaps
            .iter()
            .filter(|gap| gap.severity.is_high())
            .collect()
    }

    pub fn has_critical_warnings(&self) -> bool {
        self.warnings.iter().any(Warning::is_critical)
    }
}
