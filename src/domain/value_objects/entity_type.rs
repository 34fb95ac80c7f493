use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Location,
    Plant,
    Action,
    Photo,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Location => "location",
            EntityType::Plant => "plant",
            EntityType::Action => "action",
            EntityType::Photo => "photo",
        }
    }

    /// Remote table the entity lives in.
    pub fn table(&self) -> &'static str {
        match self {
            EntityType::Location => "locations",
            EntityType::Plant => "plants",
            EntityType::Action => "care_actions",
            EntityType::Photo => "plant_photos",
        }
    }

    /// Payload fields other than `id` that may reference a not-yet-synced entity.
    pub fn foreign_keys(&self) -> &'static [&'static str] {
        match self {
            EntityType::Location => &[],
            EntityType::Plant => &["location_id"],
            EntityType::Action | EntityType::Photo => &["plant_id"],
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "location" => Ok(EntityType::Location),
            "plant" => Ok(EntityType::Plant),
            "action" => Ok(EntityType::Action),
            "photo" => Ok(EntityType::Photo),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}
