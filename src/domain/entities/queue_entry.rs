use crate::domain::value_objects::{
    EntityId, EntityType, ID_FIELD, MutationOperation, MutationPayload, QueueEntryId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One pending mutation waiting to be replayed against the remote datastore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub id: QueueEntryId,
    pub entity_type: EntityType,
    /// `None` for photo uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<MutationOperation>,
    pub payload: MutationPayload,
    pub enqueued_at_epoch_millis: i64,
}

impl QueueEntry {
    /// Builds a new entry, assigning a temporary id to entities that do not
    /// exist remotely yet.
    pub fn new(
        entity_type: EntityType,
        operation: Option<MutationOperation>,
        mut payload: MutationPayload,
    ) -> Result<Self, String> {
        let id = match (entity_type, operation) {
            (EntityType::Photo, Some(op)) => {
                return Err(format!("Photo uploads take no operation, got `{op}`"));
            }
            (EntityType::Photo, None) | (_, Some(MutationOperation::Create)) => {
                let entity_id = match payload.entity_id()? {
                    Some(id @ EntityId::Temporary(_)) => id,
                    Some(EntityId::Real(raw)) => {
                        return Err(format!(
                            "New {entity_type} cannot carry a remote id `{raw}`"
                        ));
                    }
                    None => {
                        let id = EntityId::new_temporary();
                        payload.set_id_field(ID_FIELD, &id);
                        id
                    }
                };
                QueueEntryId::for_entity(&entity_id)
            }
            (_, Some(op)) => {
                if payload.entity_id()?.is_none() {
                    return Err(format!("`{op}` on {entity_type} requires an `id` field"));
                }
                QueueEntryId::generate()
            }
            (_, None) => {
                return Err(format!("{entity_type} mutations require an operation"));
            }
        };

        Ok(Self {
            id,
            entity_type,
            operation,
            payload,
            enqueued_at_epoch_millis: Utc::now().timestamp_millis(),
        })
    }

    pub fn target_id(&self) -> Option<EntityId> {
        self.payload.entity_id().ok().flatten()
    }

    /// Raw ids (own and foreign keys) this entry touches, as enqueued.
    pub fn referenced_ids(&self) -> Vec<EntityId> {
        std::iter::once(ID_FIELD)
            .chain(self.entity_type.foreign_keys().iter().copied())
            .filter_map(|field| self.payload.id_field(field).ok().flatten())
            .collect()
    }

    pub fn operation_label(&self) -> &'static str {
        self.operation.map(|op| op.as_str()).unwrap_or("upload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> MutationPayload {
        MutationPayload::new(value).unwrap()
    }

    #[test]
    fn create_assigns_temporary_id_when_missing() {
        let entry = QueueEntry::new(
            EntityType::Plant,
            Some(MutationOperation::Create),
            payload(json!({"name": "Pothos"})),
        )
        .unwrap();

        let target = entry.target_id().unwrap();
        assert!(target.is_temporary());
        assert_eq!(entry.id.as_str(), target.as_str());
    }

    #[test]
    fn create_keeps_supplied_temporary_id() {
        let entry = QueueEntry::new(
            EntityType::Location,
            Some(MutationOperation::Create),
            payload(json!({"id": "temp-abc", "name": "Kitchen"})),
        )
        .unwrap();
        assert_eq!(entry.id.as_str(), "temp-abc");
    }

    #[test]
    fn rejects_inconsistent_operations() {
        assert!(QueueEntry::new(
            EntityType::Photo,
            Some(MutationOperation::Update),
            payload(json!({"plant_id": "1"}))
        )
        .is_err());
        assert!(QueueEntry::new(EntityType::Plant, None, payload(json!({}))).is_err());
        assert!(QueueEntry::new(
            EntityType::Plant,
            Some(MutationOperation::Delete),
            payload(json!({"name": "x"}))
        )
        .is_err());
        assert!(QueueEntry::new(
            EntityType::Plant,
            Some(MutationOperation::Create),
            payload(json!({"id": "99"}))
        )
        .is_err());
    }

    #[test]
    fn referenced_ids_include_foreign_keys() {
        let entry = QueueEntry::new(
            EntityType::Action,
            Some(MutationOperation::Create),
            payload(json!({"id": "temp-a", "plant_id": "temp-p", "kind": "water"})),
        )
        .unwrap();
        assert_eq!(
            entry.referenced_ids(),
            vec![
                EntityId::Temporary("temp-a".into()),
                EntityId::Temporary("temp-p".into())
            ]
        );
        assert_eq!(entry.operation_label(), "create");
    }

    #[test]
    fn photo_entries_serialize_without_operation() {
        let entry = QueueEntry::new(
            EntityType::Photo,
            None,
            payload(json!({"plant_id": "5", "photo_url": "data:image/jpeg;base64,AAAA"})),
        )
        .unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("operation").is_none());
        let back: QueueEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.operation_label(), "upload");
    }
}
