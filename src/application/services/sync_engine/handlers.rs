use super::core::{EntryOutcome, SyncEngine};
use crate::application::ports::Record;
use crate::domain::entities::QueueEntry;
use crate::domain::value_objects::{
    EmbeddedImage, EntityId, EntityType, ID_FIELD, MutationOperation, MutationPayload,
    OFFLINE_FLAG_FIELD, PHOTO_URL_FIELD,
};
use crate::shared::error::AppError;
use serde_json::{Map, Value};

/// Folder segment for images uploaded before their owner has a remote id.
pub const PENDING_SEGMENT: &str = "pending";

const PLANT_ID_FIELD: &str = "plant_id";

fn image_folder(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Location => "locations",
        EntityType::Plant | EntityType::Photo => "plants",
        EntityType::Action => "actions",
    }
}

/// Field naming the entity an image is filed under.
fn image_owner_field(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Location | EntityType::Plant => ID_FIELD,
        EntityType::Action | EntityType::Photo => PLANT_ID_FIELD,
    }
}

/// `<folder>/<owner>/<digest>.<ext>`. Identical bytes always land on the same
/// object, so a retried upload overwrites instead of duplicating.
pub fn object_path(entity_type: EntityType, owner: &str, image: &EmbeddedImage) -> String {
    format!(
        "{}/{}/{}",
        image_folder(entity_type),
        owner,
        image.object_name()
    )
}

impl SyncEngine {
    pub(super) async fn apply(&self, entry: &QueueEntry) -> Result<EntryOutcome, AppError> {
        let payload = entry.payload.clone();
        match (entry.entity_type, entry.operation) {
            (EntityType::Photo, _) => self.upload_photo(payload).await,
            (_, Some(MutationOperation::Create)) => self.create(entry, payload).await,
            (_, Some(MutationOperation::Update)) => self.update(entry, payload).await,
            (_, Some(MutationOperation::Delete)) => self.delete(entry, payload).await,
            (entity_type, None) => Err(AppError::ValidationError(format!(
                "{entity_type} entry has no operation"
            ))),
        }
    }

    async fn create(
        &self,
        entry: &QueueEntry,
        mut payload: MutationPayload,
    ) -> Result<EntryOutcome, AppError> {
        let entity_type = entry.entity_type;
        let temp_id = temporary_id(&payload)?;
        let self_owned = image_owner_field(entity_type) == ID_FIELD;
        if let Some(real_id) = self.id_map.lookup(&temp_id).await {
            tracing::info!(
                target: "sync::engine",
                temp = %temp_id,
                real = %real_id,
                "create already applied remotely; finishing replayed entry"
            );
            self.id_map.flush().await?;
            if let (true, Some(image)) = (self_owned, payload.embedded_image()?) {
                if let Err(err) = self.relocate_image(entity_type, &real_id, &image).await {
                    return self.defer_relocation(entry, &real_id, &image, err).await;
                }
            }
            return Ok(EntryOutcome::AlreadyApplied);
        }

        self.resolve_foreign_keys(entity_type, &mut payload).await?;

        let image = payload.embedded_image()?;
        if let Some(image) = &image {
            let owner = if self_owned {
                PENDING_SEGMENT.to_string()
            } else {
                owner_segment(entity_type, &payload, None)
            };
            let url = self.upload_image(entity_type, &owner, image).await?;
            payload.set_photo_url(&url);
        }

        let real_id = self.insert_remote(entity_type, payload).await?;
        if let Err(err) = self.id_map.record(&temp_id, &real_id).await {
            return Ok(unsaved_mapping(&temp_id, &real_id, err));
        }

        if let (true, Some(image)) = (self_owned, image) {
            if let Err(err) = self.relocate_image(entity_type, &real_id, &image).await {
                return self.defer_relocation(entry, &real_id, &image, err).await;
            }
        }

        Ok(EntryOutcome::Applied)
    }

    async fn update(
        &self,
        entry: &QueueEntry,
        mut payload: MutationPayload,
    ) -> Result<EntryOutcome, AppError> {
        let entity_type = entry.entity_type;
        let target = self.resolve_required(&mut payload, ID_FIELD).await?;
        self.resolve_foreign_keys(entity_type, &mut payload).await?;

        if let Some(image) = payload.embedded_image()? {
            let owner = owner_segment(entity_type, &payload, Some(&target));
            let url = self.upload_image(entity_type, &owner, &image).await?;
            payload.set_photo_url(&url);
        }

        let partial = remote_fields(payload);
        self.timed(
            "update",
            self.remote
                .update(entity_type.table(), target.as_str(), partial),
        )
        .await?;
        Ok(EntryOutcome::Applied)
    }

    async fn delete(
        &self,
        entry: &QueueEntry,
        mut payload: MutationPayload,
    ) -> Result<EntryOutcome, AppError> {
        let target = self.resolve_required(&mut payload, ID_FIELD).await?;
        self.timed(
            "delete",
            self.remote
                .delete(entry.entity_type.table(), target.as_str()),
        )
        .await?;
        Ok(EntryOutcome::Applied)
    }

    /// Standalone photo: upload under the plant, then insert the photo row.
    async fn upload_photo(&self, mut payload: MutationPayload) -> Result<EntryOutcome, AppError> {
        let temp_id = temporary_id(&payload)?;
        if self.id_map.lookup(&temp_id).await.is_some() {
            self.id_map.flush().await?;
            return Ok(EntryOutcome::AlreadyApplied);
        }

        let plant_id = self.resolve_required(&mut payload, PLANT_ID_FIELD).await?;
        match payload.embedded_image()? {
            Some(image) => {
                let url = self
                    .upload_image(EntityType::Photo, plant_id.as_str(), &image)
                    .await?;
                payload.set_photo_url(&url);
            }
            None if payload.photo_url().is_some() => {}
            None => {
                return Err(AppError::ValidationError(
                    "photo upload carries no image".to_string(),
                ));
            }
        }

        let real_id = self.insert_remote(EntityType::Photo, payload).await?;
        if let Err(err) = self.id_map.record(&temp_id, &real_id).await {
            return Ok(unsaved_mapping(&temp_id, &real_id, err));
        }
        Ok(EntryOutcome::Applied)
    }

    async fn resolve_foreign_keys(
        &self,
        entity_type: EntityType,
        payload: &mut MutationPayload,
    ) -> Result<(), AppError> {
        for field in entity_type.foreign_keys() {
            self.resolve_field(payload, field).await?;
        }
        Ok(())
    }

    async fn resolve_required(
        &self,
        payload: &mut MutationPayload,
        field: &str,
    ) -> Result<EntityId, AppError> {
        self.resolve_field(payload, field).await?.ok_or_else(|| {
            AppError::ValidationError(format!("payload is missing `{field}`"))
        })
    }

    /// Rewrites a temporary id in `field` to its remote id. An id that is still
    /// temporary means its create has not synced, so nothing is sent.
    async fn resolve_field(
        &self,
        payload: &mut MutationPayload,
        field: &str,
    ) -> Result<Option<EntityId>, AppError> {
        let Some(raw) = payload
            .id_field(field)
            .map_err(AppError::ValidationError)?
        else {
            return Ok(None);
        };

        let resolved = self.id_map.resolve(&raw).await;
        if resolved.is_temporary() {
            return Err(AppError::UnresolvedIdentifier(format!(
                "`{field}` = `{raw}` has no remote id yet"
            )));
        }
        if raw.is_temporary() {
            payload.set_id_field(field, &resolved);
        }
        Ok(Some(resolved))
    }

    async fn insert_remote(
        &self,
        entity_type: EntityType,
        payload: MutationPayload,
    ) -> Result<EntityId, AppError> {
        let table = entity_type.table();
        let stored = self
            .timed("insert", self.remote.insert(table, remote_fields(payload)))
            .await?;
        returned_id(&stored).ok_or_else(|| {
            AppError::Internal(format!("insert into `{table}` returned no usable id"))
        })
    }

    async fn upload_image(
        &self,
        entity_type: EntityType,
        owner: &str,
        image: &EmbeddedImage,
    ) -> Result<String, AppError> {
        let path = object_path(entity_type, owner, image);
        tracing::debug!(target: "sync::engine", %path, bytes = image.bytes().len(), "uploading image");
        self.timed(
            "upload",
            self.remote.upload_object(
                &self.settings.photo_bucket,
                &path,
                image.bytes(),
                image.content_type(),
            ),
        )
        .await
    }

    /// Moves an image uploaded under the pending folder to its owner's folder.
    async fn relocate_image(
        &self,
        entity_type: EntityType,
        real_id: &EntityId,
        image: &EmbeddedImage,
    ) -> Result<(), AppError> {
        let url = self
            .upload_image(entity_type, real_id.as_str(), image)
            .await?;
        let mut partial = Record::new();
        partial.insert(PHOTO_URL_FIELD.to_string(), Value::String(url));
        self.timed(
            "update",
            self.remote
                .update(entity_type.table(), real_id.as_str(), partial),
        )
        .await
    }

    /// The record exists remotely but still points at the pending image. The
    /// entry becomes an update of the real record so the next pass finishes it.
    async fn defer_relocation(
        &self,
        entry: &QueueEntry,
        real_id: &EntityId,
        image: &EmbeddedImage,
        err: AppError,
    ) -> Result<EntryOutcome, AppError> {
        let mut payload = MutationPayload::new(Value::Object(Map::new()))?;
        payload.set_id_field(ID_FIELD, real_id);
        payload.embed_image(image);

        let retry = QueueEntry {
            id: entry.id.clone(),
            entity_type: entry.entity_type,
            operation: Some(MutationOperation::Update),
            payload,
            enqueued_at_epoch_millis: entry.enqueued_at_epoch_millis,
        };
        self.queue.replace(&entry.id, retry).await?;

        Ok(EntryOutcome::Deferred(format!(
            "{} created as `{real_id}` but its image could not be moved: {err}",
            entry.entity_type
        )))
    }
}

/// The remote row exists but its id only lives in memory. The create stays
/// queued so a restart cannot strand entries that reference the temporary id;
/// the replay path skips the insert and retries the save.
fn unsaved_mapping(temp_id: &EntityId, real_id: &EntityId, err: AppError) -> EntryOutcome {
    tracing::warn!(
        target: "sync::engine",
        temp = %temp_id,
        real = %real_id,
        error = %err,
        "identifier mapping not persisted; keeping create queued"
    );
    EntryOutcome::Deferred(format!(
        "created as `{real_id}` but the mapping for `{temp_id}` was not saved: {err}"
    ))
}

fn temporary_id(payload: &MutationPayload) -> Result<EntityId, AppError> {
    match payload.entity_id().map_err(AppError::ValidationError)? {
        Some(id @ EntityId::Temporary(_)) => Ok(id),
        Some(EntityId::Real(raw)) => Err(AppError::ValidationError(format!(
            "new entity already carries remote id `{raw}`"
        ))),
        None => Err(AppError::ValidationError(
            "new entity has no temporary id".to_string(),
        )),
    }
}

fn owner_segment(
    entity_type: EntityType,
    payload: &MutationPayload,
    fallback: Option<&EntityId>,
) -> String {
    payload
        .id_field(image_owner_field(entity_type))
        .ok()
        .flatten()
        .filter(|id| !id.is_temporary())
        .or_else(|| fallback.cloned())
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| PENDING_SEGMENT.to_string())
}

/// Payload minus the fields that only mean something locally.
fn remote_fields(payload: MutationPayload) -> Record {
    let mut record = payload.into_map();
    record.remove(ID_FIELD);
    record.remove(OFFLINE_FLAG_FIELD);
    record
}

fn returned_id(record: &Record) -> Option<EntityId> {
    match record.get(ID_FIELD)? {
        Value::String(raw) => EntityId::real(raw.clone()).ok(),
        Value::Number(number) => EntityId::real(number.to_string()).ok(),
        _ => None,
    }
}
