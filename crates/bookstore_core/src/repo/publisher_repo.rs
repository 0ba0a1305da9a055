//! Publisher repository: SQLite implementation of the entity store for `publisher`.
//!
//! # Invariants
//! - Deleting a publisher clears `book.publisher_id` on every book that pointed at it.

use crate::db::with_savepoint;
use crate::model::publisher::Publisher;
use crate::model::{EntityId, EntityKind};
use crate::repo::{read_back, row_exists, EntityRepository, RepoResult, SqliteBacked};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PUBLISHER_SELECT_SQL: &str = "SELECT id, name, location FROM publisher";

/// SQLite-backed publisher repository.
pub struct SqlitePublisherRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePublisherRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityRepository for SqlitePublisherRepository<'_> {
    type Entity = Publisher;

    fn save(&self, publisher: &Publisher) -> RepoResult<Publisher> {
        let id = match publisher.id {
            None => {
                self.conn.execute(
                    "INSERT INTO publisher (name, location) VALUES (?1, ?2);",
                    params![publisher.name.as_deref(), publisher.location.as_deref()],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO publisher (id, name, location) VALUES (?1, ?2, ?3)
                     ON CONFLICT (id) DO UPDATE SET
                        name = excluded.name,
                        location = excluded.location;",
                    params![
                        id,
                        publisher.name.as_deref(),
                        publisher.location.as_deref()
                    ],
                )?;
                id
            }
        };

        read_back(self.find_by_id(id)?, EntityKind::Publisher, id)
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Publisher>> {
        let publisher = self
            .conn
            .query_row(
                &format!("{PUBLISHER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_publisher_row,
            )
            .optional()?;
        Ok(publisher)
    }

    fn exists_by_id(&self, id: EntityId) -> RepoResult<bool> {
        row_exists(self.conn, EntityKind::Publisher, id)
    }

    fn find_all(&self, _eager: bool) -> RepoResult<Vec<Publisher>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PUBLISHER_SELECT_SQL} ORDER BY id ASC;"))?;
        let publishers = stmt
            .query_map([], parse_publisher_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(publishers)
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        with_savepoint(self.conn, "publisher_delete", || {
            let detached = self.conn.execute(
                "UPDATE book SET publisher_id = NULL WHERE publisher_id = ?1;",
                [id],
            )?;
            self.conn
                .execute("DELETE FROM publisher WHERE id = ?1;", [id])?;
            debug!(
                "event=publisher_delete module=repo status=ok id={id} detached_books={detached}"
            );
            Ok(())
        })
    }
}

impl SqliteBacked for Publisher {
    type Repo<'conn> = SqlitePublisherRepository<'conn>;

    fn repository(conn: &Connection) -> Self::Repo<'_> {
        SqlitePublisherRepository::new(conn)
    }
}

fn parse_publisher_row(row: &Row<'_>) -> rusqlite::Result<Publisher> {
    Ok(Publisher {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        location: row.get("location")?,
    })
}
