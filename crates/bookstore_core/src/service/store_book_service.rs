//! Store/book link use-cases.
//!
//! # Responsibility
//! - Link and unlink single books on a store.
//! - Replace a store's whole book set.
//!
//! # Invariants
//! - Every operation returns the store as persisted after the change.
//! - Both sides stay symmetric; see `repo::store_books`.

use crate::model::store::Store;
use crate::model::{EntityId, EntityKind};
use crate::repo::store_books::StoreBookLinks;
use crate::repo::EntityRepository;
use crate::service::{ServiceError, ServiceResult};
use log::debug;
use std::collections::BTreeSet;

/// Link service over the synchronizer and the store repository.
pub struct StoreBookService<L, S>
where
    L: StoreBookLinks,
    S: EntityRepository<Entity = Store>,
{
    links: L,
    stores: S,
}

impl<L, S> StoreBookService<L, S>
where
    L: StoreBookLinks,
    S: EntityRepository<Entity = Store>,
{
    pub fn new(links: L, stores: S) -> Self {
        Self { links, stores }
    }

    /// Adds `book_id` to the store. Already linked is a no-op.
    pub fn add_book(&self, store_id: EntityId, book_id: EntityId) -> ServiceResult<Store> {
        self.links.add_book(store_id, book_id)?;
        debug!("event=store_add_book module=service status=ok store_id={store_id} book_id={book_id}");
        self.reload(store_id)
    }

    /// Removes `book_id` from the store. Not linked is a no-op.
    pub fn remove_book(&self, store_id: EntityId, book_id: EntityId) -> ServiceResult<Store> {
        self.links.remove_book(store_id, book_id)?;
        debug!(
            "event=store_remove_book module=service status=ok store_id={store_id} book_id={book_id}"
        );
        self.reload(store_id)
    }

    /// Makes `book_ids` the exact book set of the store.
    pub fn set_books(
        &self,
        store_id: EntityId,
        book_ids: &BTreeSet<EntityId>,
    ) -> ServiceResult<Store> {
        self.links.set_books_for_store(store_id, book_ids)?;
        self.reload(store_id)
    }

    fn reload(&self, store_id: EntityId) -> ServiceResult<Store> {
        self.stores
            .find_by_id(store_id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::Store,
                id: store_id,
            })
    }
}
