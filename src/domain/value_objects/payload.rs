use super::{EmbeddedImage, EmbeddedImageError, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const PHOTO_URL_FIELD: &str = "photo_url";
pub const OFFLINE_FLAG_FIELD: &str = "is_offline";

/// Entity-shaped JSON object carried by a queued mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationPayload(Map<String, Value>);

impl MutationPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err("Mutation payload cannot be null".to_string()),
            _ => Err("Mutation payload must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: &str, value: Value) -> Option<Value> {
        self.0.insert(field.to_string(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Reads an id-valued field. Missing and `null` fields are `None`.
    pub fn id_field(&self, field: &str) -> Result<Option<EntityId>, String> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => EntityId::parse(raw).map(Some),
            Some(Value::Number(number)) => EntityId::parse(&number.to_string()).map(Some),
            Some(other) => Err(format!("Field `{field}` is not an identifier: {other}")),
        }
    }

    pub fn entity_id(&self) -> Result<Option<EntityId>, String> {
        self.id_field(ID_FIELD)
    }

    pub fn set_id_field(&mut self, field: &str, id: &EntityId) {
        self.0
            .insert(field.to_string(), Value::String(id.as_str().to_string()));
    }

    pub fn is_offline(&self) -> bool {
        self.0
            .get(OFFLINE_FLAG_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The image waiting to be uploaded, if `photo_url` still holds inline data.
    pub fn embedded_image(&self) -> Result<Option<EmbeddedImage>, EmbeddedImageError> {
        let Some(raw) = self.0.get(PHOTO_URL_FIELD).and_then(Value::as_str) else {
            return Ok(None);
        };
        if EmbeddedImage::looks_embedded(raw) || (self.is_offline() && !raw.contains("://")) {
            EmbeddedImage::parse(raw).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn embed_image(&mut self, image: &EmbeddedImage) {
        self.0.insert(
            PHOTO_URL_FIELD.to_string(),
            Value::String(image.to_data_uri()),
        );
        self.0
            .insert(OFFLINE_FLAG_FIELD.to_string(), Value::Bool(true));
    }

    pub fn set_photo_url(&mut self, url: &str) {
        self.0
            .insert(PHOTO_URL_FIELD.to_string(), Value::String(url.to_string()));
        self.0.remove(OFFLINE_FLAG_FIELD);
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.0.get(PHOTO_URL_FIELD).and_then(Value::as_str)
    }
}

impl From<MutationPayload> for Value {
    fn from(payload: MutationPayload) -> Self {
        Value::Object(payload.0)
    }
}
