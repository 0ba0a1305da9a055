//! Book repository: SQLite implementation of the entity store for `book`.
//!
//! # Invariants
//! - `author`/`publisher` must reference existing rows on write.
//! - Saving a book never writes links; `stores` is read-only here and is
//!   changed from the store side or through the synchronizer.
//! - Deleting a book detaches it from every store.

use crate::db::with_savepoint;
use crate::model::book::Book;
use crate::model::{refs_from_ids, EntityId, EntityKind, EntityRef};
use crate::repo::store_books::{SqliteStoreBookLinks, StoreBookLinks};
use crate::repo::{
    ensure_referenced, read_back, row_exists, EntityRepository, RepoResult, SqliteBacked,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const BOOK_SELECT_SQL: &str = "SELECT id, title, page_no, author_id, publisher_id FROM book";

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn links(&self) -> SqliteStoreBookLinks<'conn> {
        SqliteStoreBookLinks::new(self.conn)
    }

    fn check_references(&self, book: &Book) -> RepoResult<()> {
        if let Some(author) = book.author {
            ensure_referenced(self.conn, EntityKind::Author, author.id)?;
        }
        if let Some(publisher) = book.publisher {
            ensure_referenced(self.conn, EntityKind::Publisher, publisher.id)?;
        }
        Ok(())
    }

    fn upsert_row(&self, book: &Book) -> RepoResult<EntityId> {
        let author_id = book.author.map(|author| author.id);
        let publisher_id = book.publisher.map(|publisher| publisher.id);

        match book.id {
            None => {
                self.conn.execute(
                    "INSERT INTO book (title, page_no, author_id, publisher_id)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![book.title.as_deref(), book.page_no, author_id, publisher_id],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO book (id, title, page_no, author_id, publisher_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (id) DO UPDATE SET
                        title = excluded.title,
                        page_no = excluded.page_no,
                        author_id = excluded.author_id,
                        publisher_id = excluded.publisher_id;",
                    params![
                        id,
                        book.title.as_deref(),
                        book.page_no,
                        author_id,
                        publisher_id
                    ],
                )?;
                Ok(id)
            }
        }
    }
}

impl EntityRepository for SqliteBookRepository<'_> {
    type Entity = Book;

    fn save(&self, book: &Book) -> RepoResult<Book> {
        with_savepoint(self.conn, "book_save", || {
            self.check_references(book)?;
            let id = self.upsert_row(book)?;
            read_back(self.find_by_id(id)?, EntityKind::Book, id)
        })
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Book>> {
        let book = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_book_row,
            )
            .optional()?;

        match book {
            Some(mut book) => {
                book.stores = refs_from_ids(self.links().stores_for_book(id)?);
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: EntityId) -> RepoResult<bool> {
        row_exists(self.conn, EntityKind::Book, id)
    }

    fn find_all(&self, eager: bool) -> RepoResult<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut books = stmt
            .query_map([], parse_book_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if eager {
            let index = self.links().load_index()?;
            for book in &mut books {
                if let Some(id) = book.id {
                    book.stores = refs_from_ids(index.stores_of(id));
                }
            }
        }

        Ok(books)
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        with_savepoint(self.conn, "book_delete", || {
            self.links().detach_book(id)?;
            self.conn.execute("DELETE FROM book WHERE id = ?1;", [id])?;
            Ok(())
        })
    }
}

impl SqliteBacked for Book {
    type Repo<'conn> = SqliteBookRepository<'conn>;

    fn repository(conn: &Connection) -> Self::Repo<'_> {
        SqliteBookRepository::new(conn)
    }
}

fn parse_book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        page_no: row.get("page_no")?,
        author: row.get::<_, Option<EntityId>>("author_id")?.map(EntityRef::new),
        publisher: row
            .get::<_, Option<EntityId>>("publisher_id")?
            .map(EntityRef::new),
        stores: Default::default(),
    })
}
