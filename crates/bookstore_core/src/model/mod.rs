//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records persisted by the catalog (book, store, author, publisher).
//! - Define the shared identity contract used by repositories and services.
//!
//! # Invariants
//! - Identifiers are assigned by storage on first save and never change.
//! - Two records are the same entity only when both carry the same id.
//! - Relations are held as id sets, never as back-pointers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub mod author;
pub mod book;
pub mod publisher;
pub mod store;

/// Storage-assigned identifier shared by all entity types.
pub type EntityId = i64;

/// Reference to a related entity, serialized as `{"id": n}`.
///
/// Clients may send the full related object; only `id` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

/// Collects the ids out of a reference set.
pub fn ref_ids(refs: &BTreeSet<EntityRef>) -> BTreeSet<EntityId> {
    refs.iter().map(|entity_ref| entity_ref.id).collect()
}

/// Builds a reference set from ids.
pub fn refs_from_ids<I>(ids: I) -> BTreeSet<EntityRef>
where
    I: IntoIterator<Item = EntityId>,
{
    ids.into_iter().map(EntityRef::new).collect()
}

/// Entity type tag used in errors, logs and HTTP alert headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Book,
    Publisher,
    Store,
}

impl EntityKind {
    /// Lowercase entity name (`store`, `book`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Book => "book",
            Self::Publisher => "publisher",
            Self::Store => "store",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and merge contract shared by every persisted record.
pub trait Entity: Clone + std::fmt::Debug {
    const KIND: EntityKind;

    /// Storage identifier, `None` until first save.
    fn id(&self) -> Option<EntityId>;

    /// Sets the storage identifier. Only repositories call this.
    fn assign_id(&mut self, id: EntityId);

    /// Overwrites scalar fields with the non-null fields of `patch`.
    ///
    /// Relation sets and the id are never touched.
    fn merge_from(&mut self, patch: &Self);

    /// Identifier-based equality: both ids present and equal.
    fn same_identity(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(left), Some(right)) if left == right)
    }
}

/// Replaces `target` with `value` only when `value` is set.
pub(crate) fn merge_field<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}
