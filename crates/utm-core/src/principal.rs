//! Caller identity supplied by the identity provider.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    UtmAdmin,
    IndividualOperator,
    FleetOperator,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UTM_ADMIN" => Some(Role::UtmAdmin),
            "INDIVIDUAL_OPERATOR" => Some(Role::IndividualOperator),
            "FLEET_OPERATOR" => Some(Role::FleetOperator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::UtmAdmin => "UTM_ADMIN",
            Role::IndividualOperator => "INDIVIDUAL_OPERATOR",
            Role::FleetOperator => "FLEET_OPERATOR",
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}
