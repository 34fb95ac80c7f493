use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

pub const TEMPORARY_ID_PREFIX: &str = "temp-";

/// Identifier of a domain entity. Entities created offline carry a
/// client-generated temporary id until the remote datastore assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityId {
    Temporary(String),
    Real(String),
}

impl EntityId {
    pub fn new_temporary() -> Self {
        EntityId::Temporary(format!(
            "{TEMPORARY_ID_PREFIX}{}",
            Uuid::new_v4().simple()
        ))
    }

    pub fn real(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        Self::validate(&value)?;
        if value.starts_with(TEMPORARY_ID_PREFIX) {
            return Err(format!("Remote id cannot use the temporary prefix: {value}"));
        }
        Ok(EntityId::Real(value))
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        Self::validate(value)?;
        if value.starts_with(TEMPORARY_ID_PREFIX) {
            Ok(EntityId::Temporary(value.to_string()))
        } else {
            Ok(EntityId::Real(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Temporary(value) | EntityId::Real(value) => value,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, EntityId::Temporary(_))
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Entity ID cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        match id {
            EntityId::Temporary(value) | EntityId::Real(value) => value,
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FromStr for EntityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
