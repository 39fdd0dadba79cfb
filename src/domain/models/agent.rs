//! Agent domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Agent status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Failed,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Busy => write!(f, "busy"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AgentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "busy" => Ok(Self::Busy),
            "failed" => Ok(Self::Failed),
            _ => Err(anyhow::anyhow!("Invalid agent status: {s}")),
        }
    }
}

/// Coarse quality/cost selector mapped to a worker model configuration.
///
/// Unknown tier strings deserialize to [`ResourceTier::Medium`]; tier records
/// written by older versions or foreign tools therefore degrade gracefully
/// instead of failing the launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTier {
    Low,
    #[default]
    Medium,
    High,
}

impl<'de> Deserialize<'de> for ResourceTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse_or_default(&s))
    }
}

impl ResourceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse a tier string, falling back to `Medium` for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for ResourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agent entity: a persona that tasks can be assigned to.
///
/// Only the fields the execution core reads are modeled here; persona and
/// layout payloads belong to the excluded persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Resource tier used when launching workers for this agent's tasks
    pub tier: ResourceTier,

    /// Current agent status
    pub status: AgentStatus,

    /// Last status-change timestamp
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new idle agent.
    pub fn new(name: impl Into<String>, tier: ResourceTier) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tier,
            status: AgentStatus::Idle,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_status_display() {
        assert_eq!(AgentStatus::Idle.to_string(), "idle");
        assert_eq!(AgentStatus::Busy.to_string(), "busy");
        assert_eq!(AgentStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_agent_status_from_str() {
        assert_eq!("idle".parse::<AgentStatus>().unwrap(), AgentStatus::Idle);
        assert_eq!("FAILED".parse::<AgentStatus>().unwrap(), AgentStatus::Failed);
        assert!("invalid".parse::<AgentStatus>().is_err());
    }

    #[test]
    fn test_tier_fallback() {
        assert_eq!(ResourceTier::parse_or_default("low"), ResourceTier::Low);
        assert_eq!(ResourceTier::parse_or_default("HIGH"), ResourceTier::High);
        assert_eq!(ResourceTier::parse_or_default("turbo"), ResourceTier::Medium);
        assert_eq!(ResourceTier::default(), ResourceTier::Medium);
    }

    #[test]
    fn test_tier_deserialize_unknown() {
        let tier: ResourceTier = serde_json::from_str("\"experimental\"").unwrap();
        assert_eq!(tier, ResourceTier::Medium);
        let tier: ResourceTier = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(tier, ResourceTier::High);
    }
}
