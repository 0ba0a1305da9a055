//! Store domain model.
//!
//! # Invariants
//! - Store is the owning side of the store/book association.
//! - `books` mirrors the join table; every listed book lists this store back.

use super::{merge_field, ref_ids, Entity, EntityId, EntityKind, EntityRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A physical shop that carries a set of books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    /// Legacy clients send this as `adress`.
    #[serde(alias = "adress")]
    pub address: Option<String>,
    #[serde(default)]
    pub books: BTreeSet<EntityRef>,
}

impl Store {
    /// Creates an unsaved store with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Ids of the books carried by this store.
    pub fn book_ids(&self) -> BTreeSet<EntityId> {
        ref_ids(&self.books)
    }
}

impl Entity for Store {
    const KIND: EntityKind = EntityKind::Store;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.name, &patch.name);
        merge_field(&mut self.address, &patch.address);
    }
}
