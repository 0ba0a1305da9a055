//! Generic CRUD service with identifier rules.
//!
//! # Responsibility
//! - create / update / partial update / delete / get / list for any entity.
//!
//! # Invariants
//! - create rejects payloads that already carry an id.
//! - update and partial update require payload id == path id and an
//!   existing record, checked in that order.
//! - partial update only overwrites non-null scalar fields.
//! - delete is idempotent.

use crate::model::{Entity, EntityId};
use crate::repo::EntityRepository;
use crate::service::{ServiceError, ServiceResult};
use log::debug;

/// Use-case service wrapper for one entity repository.
pub struct EntityService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> EntityService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new record and returns it with its assigned id.
    pub fn create(&self, entity: &R::Entity) -> ServiceResult<R::Entity> {
        let kind = <R::Entity as Entity>::KIND;
        debug!("event=entity_create module=service status=start entity={kind}");
        if entity.id().is_some() {
            return Err(ServiceError::IdAlreadyPresent { kind });
        }

        let saved = self.repo.save(entity)?;
        debug!(
            "event=entity_create module=service status=ok entity={kind} id={}",
            saved.id().unwrap_or_default()
        );
        Ok(saved)
    }

    /// Replaces the record at `path_id` with `entity`, relations included.
    pub fn update(&self, path_id: EntityId, entity: &R::Entity) -> ServiceResult<R::Entity> {
        debug!(
            "event=entity_update module=service status=start entity={} id={path_id}",
            <R::Entity as Entity>::KIND
        );
        self.check_target(path_id, entity)?;
        Ok(self.repo.save(entity)?)
    }

    /// Merges the non-null fields of `patch` into the record at `path_id`.
    pub fn partial_update(&self, path_id: EntityId, patch: &R::Entity) -> ServiceResult<R::Entity> {
        let kind = <R::Entity as Entity>::KIND;
        debug!("event=entity_patch module=service status=start entity={kind} id={path_id}");
        self.check_target(path_id, patch)?;

        let mut existing = self
            .repo
            .find_by_id(path_id)?
            .ok_or(ServiceError::NotFound { kind, id: path_id })?;
        existing.merge_from(patch);
        Ok(self.repo.save(&existing)?)
    }

    /// Loads one record with relations populated.
    pub fn get(&self, id: EntityId) -> ServiceResult<R::Entity> {
        self.repo.find_by_id(id)?.ok_or(ServiceError::NotFound {
            kind: <R::Entity as Entity>::KIND,
            id,
        })
    }

    /// Lists all records by ascending id.
    pub fn list(&self, eager: bool) -> ServiceResult<Vec<R::Entity>> {
        Ok(self.repo.find_all(eager)?)
    }

    /// Removes one record. Missing ids succeed without changes.
    pub fn delete(&self, id: EntityId) -> ServiceResult<()> {
        debug!(
            "event=entity_delete module=service status=start entity={} id={id}",
            <R::Entity as Entity>::KIND
        );
        Ok(self.repo.delete_by_id(id)?)
    }

    fn check_target(&self, path_id: EntityId, entity: &R::Entity) -> ServiceResult<()> {
        let kind = <R::Entity as Entity>::KIND;
        let body_id = entity.id().ok_or(ServiceError::IdMissing { kind })?;
        if body_id != path_id {
            return Err(ServiceError::IdMismatch {
                kind,
                path_id,
                body_id,
            });
        }
        if !self.repo.exists_by_id(path_id)? {
            return Err(ServiceError::NotFound { kind, id: path_id });
        }
        Ok(())
    }
}
