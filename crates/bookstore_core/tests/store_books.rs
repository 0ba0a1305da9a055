use bookstore_core::db::open_db_in_memory;
use bookstore_core::model::refs_from_ids;
use bookstore_core::{
    Book, EntityId, EntityRepository, RepoError, SqliteBookRepository, SqliteStoreBookLinks,
    SqliteStoreRepository, Store, StoreBookLinks,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

fn seed_books(conn: &Connection, titles: &[&str]) -> Vec<EntityId> {
    let repo = SqliteBookRepository::new(conn);
    titles
        .iter()
        .map(|title| repo.save(&Book::titled(*title)).unwrap().id.unwrap())
        .collect()
}

fn seed_store(conn: &Connection, name: &str) -> EntityId {
    SqliteStoreRepository::new(conn)
        .save(&Store::named(name))
        .unwrap()
        .id
        .unwrap()
}

fn assert_symmetric(conn: &Connection) {
    let links = SqliteStoreBookLinks::new(conn);
    for store in SqliteStoreRepository::new(conn).find_all(true).unwrap() {
        let store_id = store.id.unwrap();
        for book_id in store.book_ids() {
            assert!(
                links.stores_for_book(book_id).unwrap().contains(&store_id),
                "book {book_id} does not list store {store_id}"
            );
        }
    }
    for book in SqliteBookRepository::new(conn).find_all(true).unwrap() {
        let book_id = book.id.unwrap();
        for store_id in book.store_ids() {
            assert!(
                links.books_for_store(store_id).unwrap().contains(&book_id),
                "store {store_id} does not list book {book_id}"
            );
        }
    }
}

#[test]
fn set_books_for_store_links_new_and_unlinks_dropped_books() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a", "b", "c"]);
    let store_id = seed_store(&conn, "Central");
    let links = SqliteStoreBookLinks::new(&conn);

    links
        .set_books_for_store(store_id, &BTreeSet::from([books[0], books[1]]))
        .unwrap();
    let diff = links
        .set_books_for_store(store_id, &BTreeSet::from([books[1], books[2]]))
        .unwrap();

    assert_eq!(diff.to_add, BTreeSet::from([books[2]]));
    assert_eq!(diff.to_remove, BTreeSet::from([books[0]]));
    assert!(links.stores_for_book(books[0]).unwrap().is_empty());
    assert_eq!(
        links.stores_for_book(books[1]).unwrap(),
        BTreeSet::from([store_id])
    );
    assert_eq!(
        links.stores_for_book(books[2]).unwrap(),
        BTreeSet::from([store_id])
    );
    assert_symmetric(&conn);
}

#[test]
fn set_books_for_store_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a", "b"]);
    let store_id = seed_store(&conn, "Central");
    let links = SqliteStoreBookLinks::new(&conn);
    let desired: BTreeSet<_> = books.iter().copied().collect();

    links.set_books_for_store(store_id, &desired).unwrap();
    let once = links.load_index().unwrap();
    let second = links.set_books_for_store(store_id, &desired).unwrap();
    let twice = links.load_index().unwrap();

    assert!(second.is_empty());
    assert_eq!(once, twice);
}

#[test]
fn set_books_rejects_unknown_book_and_keeps_previous_links() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a"]);
    let store_id = seed_store(&conn, "Central");
    let links = SqliteStoreBookLinks::new(&conn);
    links
        .set_books_for_store(store_id, &BTreeSet::from([books[0]]))
        .unwrap();

    let err = links
        .set_books_for_store(store_id, &BTreeSet::from([404]))
        .unwrap_err();

    assert!(matches!(err, RepoError::UnknownReference { id: 404, .. }));
    assert_eq!(
        links.books_for_store(store_id).unwrap(),
        BTreeSet::from([books[0]])
    );
}

#[test]
fn add_and_remove_use_set_semantics() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a"]);
    let store_id = seed_store(&conn, "Central");
    let links = SqliteStoreBookLinks::new(&conn);

    links.add_book(store_id, books[0]).unwrap();
    links.add_book(store_id, books[0]).unwrap();
    assert_eq!(links.load_index().unwrap().len(), 1);

    links.remove_book(store_id, books[0]).unwrap();
    links.remove_book(store_id, books[0]).unwrap();
    assert!(links.load_index().unwrap().is_empty());
}

#[test]
fn add_book_to_missing_store_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a"]);
    let links = SqliteStoreBookLinks::new(&conn);

    let err = links.add_book(8, books[0]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 8, .. }));
}

#[test]
fn store_save_and_book_side_replacement_stay_symmetric() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a", "b"]);
    let store_a = seed_store(&conn, "A");
    let store_b = seed_store(&conn, "B");
    let store_repo = SqliteStoreRepository::new(&conn);
    let book_repo = SqliteBookRepository::new(&conn);

    let mut store = store_repo.find_by_id(store_a).unwrap().unwrap();
    store.books = refs_from_ids(books.clone());
    store_repo.save(&store).unwrap();

    let book = book_repo.find_by_id(books[0]).unwrap().unwrap();
    assert_eq!(book.store_ids(), BTreeSet::from([store_a]));
    SqliteStoreBookLinks::new(&conn)
        .set_stores_for_book(books[0], &BTreeSet::from([store_b]))
        .unwrap();

    let reloaded = store_repo.find_by_id(store_a).unwrap().unwrap();
    assert_eq!(reloaded.book_ids(), BTreeSet::from([books[1]]));
    let other = store_repo.find_by_id(store_b).unwrap().unwrap();
    assert_eq!(other.book_ids(), BTreeSet::from([books[0]]));
    assert_symmetric(&conn);
}

#[test]
fn book_save_never_touches_store_links() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["Foo"]);
    let store_id = seed_store(&conn, "Central");
    let other_store = seed_store(&conn, "Other");
    SqliteStoreBookLinks::new(&conn)
        .add_book(store_id, books[0])
        .unwrap();
    let book_repo = SqliteBookRepository::new(&conn);

    let edited = Book {
        id: Some(books[0]),
        title: Some("Foo 2".to_string()),
        page_no: Some(10),
        ..Book::default()
    };
    let saved = book_repo.save(&edited).unwrap();
    assert_eq!(saved.store_ids(), BTreeSet::from([store_id]));

    let mut moved = saved.clone();
    moved.stores = refs_from_ids([other_store]);
    book_repo.save(&moved).unwrap();

    let store = SqliteStoreRepository::new(&conn)
        .find_by_id(store_id)
        .unwrap()
        .unwrap();
    assert_eq!(store.book_ids(), BTreeSet::from([books[0]]));
    assert_eq!(
        book_repo.find_by_id(books[0]).unwrap().unwrap().title.as_deref(),
        Some("Foo 2")
    );
    assert_symmetric(&conn);
}

#[test]
fn deleting_store_detaches_but_keeps_books() {
    let conn = open_db_in_memory().unwrap();
    let store_repo = SqliteStoreRepository::new(&conn);
    let book_repo = SqliteBookRepository::new(&conn);

    let store = store_repo.save(&Store::named("Central")).unwrap();
    let book = book_repo.save(&Book::titled("Foo")).unwrap();
    assert_eq!(store.id, Some(1));
    assert_eq!(book.id, Some(1));

    SqliteStoreBookLinks::new(&conn).add_book(1, 1).unwrap();
    assert_eq!(
        store_repo.find_by_id(1).unwrap().unwrap().book_ids(),
        BTreeSet::from([1])
    );
    assert_eq!(
        book_repo.find_by_id(1).unwrap().unwrap().store_ids(),
        BTreeSet::from([1])
    );

    store_repo.delete_by_id(1).unwrap();

    let book = book_repo.find_by_id(1).unwrap().expect("book must survive");
    assert!(book.stores.is_empty());
    assert!(store_repo.find_by_id(1).unwrap().is_none());
}

#[test]
fn deleting_book_detaches_from_stores() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a", "b"]);
    let store_id = seed_store(&conn, "Central");
    let links = SqliteStoreBookLinks::new(&conn);
    links
        .set_books_for_store(store_id, &books.iter().copied().collect())
        .unwrap();

    SqliteBookRepository::new(&conn)
        .delete_by_id(books[0])
        .unwrap();

    assert_eq!(
        links.books_for_store(store_id).unwrap(),
        BTreeSet::from([books[1]])
    );
    assert_symmetric(&conn);
}

#[test]
fn lazy_listing_leaves_relations_empty() {
    let conn = open_db_in_memory().unwrap();
    let books = seed_books(&conn, &["a"]);
    let store_id = seed_store(&conn, "Central");
    SqliteStoreBookLinks::new(&conn)
        .add_book(store_id, books[0])
        .unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let lazy = repo.find_all(false).unwrap();
    let eager = repo.find_all(true).unwrap();

    assert!(lazy[0].books.is_empty());
    assert_eq!(eager[0].book_ids(), BTreeSet::from([books[0]]));
}
