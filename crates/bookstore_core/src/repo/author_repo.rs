//! Author repository: SQLite implementation of the entity store for `author`.
//!
//! # Invariants
//! - Deleting an author clears `book.author_id` on every book that pointed at it.

use crate::db::with_savepoint;
use crate::model::author::Author;
use crate::model::{EntityId, EntityKind};
use crate::repo::{read_back, row_exists, EntityRepository, RepoResult, SqliteBacked};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const AUTHOR_SELECT_SQL: &str = "SELECT id, name, age, gender FROM author";

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityRepository for SqliteAuthorRepository<'_> {
    type Entity = Author;

    fn save(&self, author: &Author) -> RepoResult<Author> {
        let id = match author.id {
            None => {
                self.conn.execute(
                    "INSERT INTO author (name, age, gender) VALUES (?1, ?2, ?3);",
                    params![author.name.as_deref(), author.age, author.gender.as_deref()],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO author (id, name, age, gender) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (id) DO UPDATE SET
                        name = excluded.name,
                        age = excluded.age,
                        gender = excluded.gender;",
                    params![
                        id,
                        author.name.as_deref(),
                        author.age,
                        author.gender.as_deref()
                    ],
                )?;
                id
            }
        };

        read_back(self.find_by_id(id)?, EntityKind::Author, id)
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_author_row,
            )
            .optional()?;
        Ok(author)
    }

    fn exists_by_id(&self, id: EntityId) -> RepoResult<bool> {
        row_exists(self.conn, EntityKind::Author, id)
    }

    fn find_all(&self, _eager: bool) -> RepoResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY id ASC;"))?;
        let authors = stmt
            .query_map([], parse_author_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(authors)
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        with_savepoint(self.conn, "author_delete", || {
            let detached = self
                .conn
                .execute("UPDATE book SET author_id = NULL WHERE author_id = ?1;", [id])?;
            self.conn.execute("DELETE FROM author WHERE id = ?1;", [id])?;
            debug!("event=author_delete module=repo status=ok id={id} detached_books={detached}");
            Ok(())
        })
    }
}

impl SqliteBacked for Author {
    type Repo<'conn> = SqliteAuthorRepository<'conn>;

    fn repository(conn: &Connection) -> Self::Repo<'_> {
        SqliteAuthorRepository::new(conn)
    }
}

fn parse_author_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        age: row.get("age")?,
        gender: row.get("gender")?,
    })
}
