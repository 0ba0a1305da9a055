//! Store repository: SQLite implementation of the entity store for `store`.
//!
//! # Invariants
//! - Saving a store replaces its book set through the synchronizer.
//! - Deleting a store detaches it from every book; books are never deleted.

use crate::db::with_savepoint;
use crate::model::store::Store;
use crate::model::{refs_from_ids, EntityId, EntityKind};
use crate::repo::store_books::{SqliteStoreBookLinks, StoreBookLinks};
use crate::repo::{read_back, row_exists, EntityRepository, RepoResult, SqliteBacked};
use rusqlite::{params, Connection, OptionalExtension, Row};

const STORE_SELECT_SQL: &str = "SELECT id, name, address FROM store";

/// SQLite-backed store repository.
pub struct SqliteStoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn links(&self) -> SqliteStoreBookLinks<'conn> {
        SqliteStoreBookLinks::new(self.conn)
    }

    fn upsert_row(&self, store: &Store) -> RepoResult<EntityId> {
        match store.id {
            None => {
                self.conn.execute(
                    "INSERT INTO store (name, address) VALUES (?1, ?2);",
                    params![store.name.as_deref(), store.address.as_deref()],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO store (id, name, address) VALUES (?1, ?2, ?3)
                     ON CONFLICT (id) DO UPDATE SET
                        name = excluded.name,
                        address = excluded.address;",
                    params![id, store.name.as_deref(), store.address.as_deref()],
                )?;
                Ok(id)
            }
        }
    }
}

impl EntityRepository for SqliteStoreRepository<'_> {
    type Entity = Store;

    fn save(&self, store: &Store) -> RepoResult<Store> {
        with_savepoint(self.conn, "store_save", || {
            let id = self.upsert_row(store)?;
            self.links().set_books_for_store(id, &store.book_ids())?;
            read_back(self.find_by_id(id)?, EntityKind::Store, id)
        })
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Store>> {
        let store = self
            .conn
            .query_row(
                &format!("{STORE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_store_row,
            )
            .optional()?;

        match store {
            Some(mut store) => {
                store.books = refs_from_ids(self.links().books_for_store(id)?);
                Ok(Some(store))
            }
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: EntityId) -> RepoResult<bool> {
        row_exists(self.conn, EntityKind::Store, id)
    }

    fn find_all(&self, eager: bool) -> RepoResult<Vec<Store>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STORE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut stores = stmt
            .query_map([], parse_store_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if eager {
            let index = self.links().load_index()?;
            for store in &mut stores {
                if let Some(id) = store.id {
                    store.books = refs_from_ids(index.books_of(id));
                }
            }
        }

        Ok(stores)
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        with_savepoint(self.conn, "store_delete", || {
            self.links().detach_store(id)?;
            self.conn.execute("DELETE FROM store WHERE id = ?1;", [id])?;
            Ok(())
        })
    }
}

impl SqliteBacked for Store {
    type Repo<'conn> = SqliteStoreRepository<'conn>;

    fn repository(conn: &Connection) -> Self::Repo<'_> {
        SqliteStoreRepository::new(conn)
    }
}

fn parse_store_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        address: row.get("address")?,
        books: Default::default(),
    })
}
