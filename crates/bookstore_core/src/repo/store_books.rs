//! Store/book association: the relationship synchronizer.
//!
//! # Responsibility
//! - Be the only writer of `rel_store__books`.
//! - Replace, add, remove and detach links from either side.
//! - Build the two-way in-memory index used for eager loading.
//!
//! # Invariants
//! - One row per `(store_id, books_id)` pair; both directions are derived
//!   from the same rows, so a store lists a book iff the book lists the store.
//! - Replacing a link set is a pure diff of current vs desired ids; applying
//!   the same desired set twice changes nothing the second time.
//! - Every replacement runs inside one savepoint.

use crate::db::with_savepoint;
use crate::model::{EntityId, EntityKind};
use crate::repo::{ensure_exists, ensure_referenced, RepoResult};
use log::debug;
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, BTreeSet};

/// Links to insert and delete to move from one id set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    pub to_add: BTreeSet<EntityId>,
    pub to_remove: BTreeSet<EntityId>,
}

impl LinkDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the minimal change turning `current` into `desired`.
pub fn plan_replacement(current: &BTreeSet<EntityId>, desired: &BTreeSet<EntityId>) -> LinkDiff {
    LinkDiff {
        to_add: desired.difference(current).copied().collect(),
        to_remove: current.difference(desired).copied().collect(),
    }
}

/// Two-way view of the association: store → books and book → stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    books_by_store: BTreeMap<EntityId, BTreeSet<EntityId>>,
    stores_by_book: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl LinkIndex {
    /// Builds the index from `(store_id, book_id)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (EntityId, EntityId)>,
    {
        let mut index = Self::default();
        for (store_id, book_id) in pairs {
            index.link(store_id, book_id);
        }
        index
    }

    /// Records one link in both directions.
    pub fn link(&mut self, store_id: EntityId, book_id: EntityId) {
        self.books_by_store
            .entry(store_id)
            .or_default()
            .insert(book_id);
        self.stores_by_book
            .entry(book_id)
            .or_default()
            .insert(store_id);
    }

    pub fn books_of(&self, store_id: EntityId) -> BTreeSet<EntityId> {
        self.books_by_store
            .get(&store_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stores_of(&self, book_id: EntityId) -> BTreeSet<EntityId> {
        self.stores_by_book
            .get(&book_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct links.
    pub fn len(&self) -> usize {
        self.books_by_store.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.books_by_store.is_empty()
    }
}

/// Relationship synchronizer contract for the store/book association.
pub trait StoreBookLinks {
    fn books_for_store(&self, store_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;
    fn stores_for_book(&self, book_id: EntityId) -> RepoResult<BTreeSet<EntityId>>;
    /// Makes `books` the exact book set of the store, updating both sides.
    fn set_books_for_store(
        &self,
        store_id: EntityId,
        books: &BTreeSet<EntityId>,
    ) -> RepoResult<LinkDiff>;
    /// Makes `stores` the exact store set of the book, updating both sides.
    fn set_stores_for_book(
        &self,
        book_id: EntityId,
        stores: &BTreeSet<EntityId>,
    ) -> RepoResult<LinkDiff>;
    /// Links one book to one store. Already linked is a no-op.
    fn add_book(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()>;
    /// Unlinks one book from one store. Not linked is a no-op.
    fn remove_book(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()>;
    /// Removes the store from every book's store set.
    fn detach_store(&self, store_id: EntityId) -> RepoResult<usize>;
    /// Removes the book from every store's book set.
    fn detach_book(&self, book_id: EntityId) -> RepoResult<usize>;
    /// Loads every link into a two-way index.
    fn load_index(&self) -> RepoResult<LinkIndex>;
}

/// Which end of the association an operation is keyed on.
#[derive(Debug, Clone, Copy)]
enum Side {
    Store,
    Book,
}

impl Side {
    fn owner_column(self) -> &'static str {
        match self {
            Self::Store => "store_id",
            Self::Book => "books_id",
        }
    }

    fn other_column(self) -> &'static str {
        match self {
            Self::Store => "books_id",
            Self::Book => "store_id",
        }
    }

    fn other_kind(self) -> EntityKind {
        match self {
            Self::Store => EntityKind::Book,
            Self::Book => EntityKind::Store,
        }
    }

    /// Orders `(owner, other)` as `(store_id, book_id)`.
    fn pair(self, owner: EntityId, other: EntityId) -> (EntityId, EntityId) {
        match self {
            Self::Store => (owner, other),
            Self::Book => (other, owner),
        }
    }
}

/// SQLite-backed relationship synchronizer.
pub struct SqliteStoreBookLinks<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreBookLinks<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn linked_ids(&self, side: Side, owner: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {other} FROM rel_store__books WHERE {owner_col} = ?1 ORDER BY {other};",
            other = side.other_column(),
            owner_col = side.owner_column(),
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            ids.insert(row.get(0)?);
        }
        Ok(ids)
    }

    fn replace(
        &self,
        side: Side,
        owner: EntityId,
        desired: &BTreeSet<EntityId>,
    ) -> RepoResult<LinkDiff> {
        with_savepoint(self.conn, "replace_links", || {
            let current = self.linked_ids(side, owner)?;
            let diff = plan_replacement(&current, desired);
            if diff.is_empty() {
                return Ok(diff);
            }

            for other in &diff.to_add {
                ensure_referenced(self.conn, side.other_kind(), *other)?;
            }
            for other in &diff.to_remove {
                let (store_id, book_id) = side.pair(owner, *other);
                self.delete_pair(store_id, book_id)?;
            }
            for other in &diff.to_add {
                let (store_id, book_id) = side.pair(owner, *other);
                self.insert_pair(store_id, book_id)?;
            }

            debug!(
                "event=links_replace module=repo status=ok side={} owner_id={} added={} removed={}",
                side.owner_column(),
                owner,
                diff.to_add.len(),
                diff.to_remove.len()
            );
            Ok(diff)
        })
    }

    fn detach(&self, side: Side, owner: EntityId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM rel_store__books WHERE {} = ?1;",
                side.owner_column()
            ),
            [owner],
        )?;
        if removed > 0 {
            debug!(
                "event=links_detach module=repo status=ok side={} owner_id={} removed={}",
                side.owner_column(),
                owner,
                removed
            );
        }
        Ok(removed)
    }

    fn insert_pair(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO rel_store__books (store_id, books_id) VALUES (?1, ?2);",
            params![store_id, book_id],
        )?;
        Ok(())
    }

    fn delete_pair(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM rel_store__books WHERE store_id = ?1 AND books_id = ?2;",
            params![store_id, book_id],
        )?;
        Ok(())
    }
}

impl StoreBookLinks for SqliteStoreBookLinks<'_> {
    fn books_for_store(&self, store_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.linked_ids(Side::Store, store_id)
    }

    fn stores_for_book(&self, book_id: EntityId) -> RepoResult<BTreeSet<EntityId>> {
        self.linked_ids(Side::Book, book_id)
    }

    fn set_books_for_store(
        &self,
        store_id: EntityId,
        books: &BTreeSet<EntityId>,
    ) -> RepoResult<LinkDiff> {
        ensure_exists(self.conn, EntityKind::Store, store_id)?;
        self.replace(Side::Store, store_id, books)
    }

    fn set_stores_for_book(
        &self,
        book_id: EntityId,
        stores: &BTreeSet<EntityId>,
    ) -> RepoResult<LinkDiff> {
        ensure_exists(self.conn, EntityKind::Book, book_id)?;
        self.replace(Side::Book, book_id, stores)
    }

    fn add_book(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()> {
        ensure_exists(self.conn, EntityKind::Store, store_id)?;
        ensure_exists(self.conn, EntityKind::Book, book_id)?;
        self.insert_pair(store_id, book_id)
    }

    fn remove_book(&self, store_id: EntityId, book_id: EntityId) -> RepoResult<()> {
        ensure_exists(self.conn, EntityKind::Store, store_id)?;
        ensure_exists(self.conn, EntityKind::Book, book_id)?;
        self.delete_pair(store_id, book_id)
    }

    fn detach_store(&self, store_id: EntityId) -> RepoResult<usize> {
        self.detach(Side::Store, store_id)
    }

    fn detach_book(&self, book_id: EntityId) -> RepoResult<usize> {
        self.detach(Side::Book, book_id)
    }

    fn load_index(&self) -> RepoResult<LinkIndex> {
        let mut stmt = self
            .conn
            .prepare("SELECT store_id, books_id FROM rel_store__books;")?;
        let mut rows = stmt.query([])?;
        let mut index = LinkIndex::default();
        while let Some(row) = rows.next()? {
            index.link(row.get(0)?, row.get(1)?);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_replacement, LinkIndex};
    use std::collections::BTreeSet;

    #[test]
    fn plan_replacement_splits_added_and_removed() {
        let current = BTreeSet::from([1, 2, 3]);
        let desired = BTreeSet::from([3, 4]);

        let diff = plan_replacement(&current, &desired);

        assert_eq!(diff.to_add, BTreeSet::from([4]));
        assert_eq!(diff.to_remove, BTreeSet::from([1, 2]));
    }

    #[test]
    fn plan_replacement_of_equal_sets_is_empty() {
        let ids = BTreeSet::from([5, 6]);
        assert!(plan_replacement(&ids, &ids).is_empty());
    }

    #[test]
    fn index_is_symmetric() {
        let index = LinkIndex::from_pairs([(1, 10), (1, 11), (2, 10), (1, 10)]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.books_of(1), BTreeSet::from([10, 11]));
        assert_eq!(index.stores_of(10), BTreeSet::from([1, 2]));
        assert!(index.stores_of(99).is_empty());
        assert!(!index.is_empty());
    }
}
