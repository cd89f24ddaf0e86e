use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_newtype!(SimId);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBadge {
    #[default]
    Green,
    Orange,
    Red,
}

impl RiskBadge {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for RiskBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskBadge {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "orange" => Ok(Self::Orange),
            "red" => Ok(Self::Red),
            _ => Err(ParseEnumError::new("risk badge", s)),
        }
    }
}

/// Remediation applied to a set of SIMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    #[serde(rename = "freeze_24h")]
    Freeze24h,
    Throttle,
    Notify,
}

impl BulkAction {
    pub const ALL: [BulkAction; 3] = [Self::Freeze24h, Self::Throttle, Self::Notify];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freeze24h => "freeze_24h",
            Self::Throttle => "throttle",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "freeze_24h" => Ok(Self::Freeze24h),
            "throttle" => Ok(Self::Throttle),
            "notify" => Ok(Self::Notify),
            _ => Err(ParseEnumError::new("action", s)),
        }
    }
}

/// Anomaly type reported by the backend. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnomalyKind {
    Spike,
    Drain,
    Inactivity,
    Roaming,
    Other(String),
}

impl AnomalyKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Spike => "spike",
            Self::Drain => "drain",
            Self::Inactivity => "inactivity",
            Self::Roaming => "roaming",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for AnomalyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "spike" => Self::Spike,
            "drain" => Self::Drain,
            "inactivity" => Self::Inactivity,
            "roaming" => Self::Roaming,
            _ => Self::Other(value),
        }
    }
}

impl From<AnomalyKind> for String {
    fn from(value: AnomalyKind) -> Self {
        match value {
            AnomalyKind::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageGranularity {
    #[default]
    Day,
    Hour,
}

impl UsageGranularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }
}

impl FromStr for UsageGranularity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            _ => Err(ParseEnumError::new("granularity", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_action_uses_backend_tags() {
        assert_eq!(
            serde_json::to_string(&BulkAction::Freeze24h).expect("encode"),
            "\"freeze_24h\""
        );
        assert_eq!(
            serde_json::from_str::<BulkAction>("\"throttle\"").expect("decode"),
            BulkAction::Throttle
        );
        assert!("freeze".parse::<BulkAction>().is_err());
    }

    #[test]
    fn unknown_anomaly_kind_is_preserved() {
        let kind: AnomalyKind = serde_json::from_str("\"sim_swap\"").expect("decode");
        assert_eq!(kind, AnomalyKind::Other("sim_swap".into()));
        assert_eq!(serde_json::to_string(&kind).expect("encode"), "\"sim_swap\"");

        let known: AnomalyKind = serde_json::from_str("\"drain\"").expect("decode");
        assert_eq!(known, AnomalyKind::Drain);
    }

    #[test]
    fn sim_id_is_transparent_on_the_wire() {
        let ids: Vec<SimId> = serde_json::from_str(r#"["2001","2002"]"#).expect("decode");
        assert_eq!(ids, vec![SimId::from("2001"), SimId::from("2002")]);
    }

    #[test]
    fn risk_badge_parses_case_insensitively() {
        assert_eq!("RED".parse::<RiskBadge>(), Ok(RiskBadge::Red));
        assert!("purple".parse::<RiskBadge>().is_err());
    }
}
