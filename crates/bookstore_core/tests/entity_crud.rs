use bookstore_core::db::open_db_in_memory;
use bookstore_core::{
    Author, Book, EntityRef, EntityRepository, Publisher, RepoError, SqliteAuthorRepository,
    SqliteBookRepository, SqlitePublisherRepository, SqliteStoreRepository, Store,
};
use std::collections::HashSet;

#[test]
fn save_without_id_assigns_fresh_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let mut seen = HashSet::new();
    for name in ["a", "b", "c"] {
        let saved = repo.save(&Store::named(name)).unwrap();
        let id = saved.id.expect("saved store should carry an id");
        assert!(seen.insert(id), "id {id} was reused");
    }
}

#[test]
fn ids_are_never_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::new(&conn);

    let first = repo.save(&Book::titled("first")).unwrap().id.unwrap();
    let second = repo.save(&Book::titled("second")).unwrap().id.unwrap();
    repo.delete_by_id(second).unwrap();

    let third = repo.save(&Book::titled("third")).unwrap().id.unwrap();
    assert!(third > second);
    assert!(second > first);
}

#[test]
fn save_with_id_overwrites_existing_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePublisherRepository::new(&conn);

    let created = repo
        .save(&Publisher {
            id: None,
            name: Some("Penguin".to_string()),
            location: Some("London".to_string()),
        })
        .unwrap();

    let replaced = repo
        .save(&Publisher {
            id: created.id,
            name: Some("Penguin Books".to_string()),
            location: None,
        })
        .unwrap();

    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.name.as_deref(), Some("Penguin Books"));
    assert_eq!(replaced.location, None);
    assert_eq!(repo.find_all(true).unwrap().len(), 1);
}

#[test]
fn find_and_exists_report_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    assert!(repo.find_by_id(77).unwrap().is_none());
    assert!(!repo.exists_by_id(77).unwrap());

    let saved = repo
        .save(&Author {
            name: Some("Ursula".to_string()),
            age: Some(88),
            ..Author::default()
        })
        .unwrap();
    let id = saved.id.unwrap();
    assert!(repo.exists_by_id(id).unwrap());
    assert_eq!(repo.find_by_id(id).unwrap(), Some(saved));
}

#[test]
fn delete_missing_id_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::new(&conn);
    let kept = repo.save(&Store::named("kept")).unwrap();

    repo.delete_by_id(999).unwrap();
    repo.delete_by_id(999).unwrap();

    assert_eq!(repo.find_all(true).unwrap(), vec![kept]);
}

#[test]
fn find_all_is_ordered_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::new(&conn);
    for name in ["c", "a", "b"] {
        repo.save(&Store::named(name)).unwrap();
    }

    let ids: Vec<_> = repo
        .find_all(false)
        .unwrap()
        .into_iter()
        .map(|store| store.id.unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn book_keeps_author_and_publisher_references() {
    let conn = open_db_in_memory().unwrap();
    let author = SqliteAuthorRepository::new(&conn)
        .save(&Author::default())
        .unwrap();
    let publisher = SqlitePublisherRepository::new(&conn)
        .save(&Publisher::default())
        .unwrap();

    let books = SqliteBookRepository::new(&conn);
    let saved = books
        .save(&Book {
            title: Some("Earthsea".to_string()),
            page_no: Some(183),
            author: Some(EntityRef::new(author.id.unwrap())),
            publisher: Some(EntityRef::new(publisher.id.unwrap())),
            ..Book::default()
        })
        .unwrap();

    let loaded = books.find_by_id(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.author, Some(EntityRef::new(author.id.unwrap())));
    assert_eq!(loaded.publisher, Some(EntityRef::new(publisher.id.unwrap())));
    assert_eq!(loaded.page_no, Some(183));
}

#[test]
fn book_with_unknown_author_is_rejected_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let books = SqliteBookRepository::new(&conn);

    let mut book = Book::titled("orphan");
    book.author = Some(EntityRef::new(12));
    let err = books.save(&book).unwrap_err();

    assert!(matches!(err, RepoError::UnknownReference { id: 12, .. }));
    assert!(books.find_all(false).unwrap().is_empty());
}

#[test]
fn deleting_author_detaches_books() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::new(&conn);
    let author_id = authors.save(&Author::default()).unwrap().id.unwrap();

    let books = SqliteBookRepository::new(&conn);
    let mut book = Book::titled("kept");
    book.author = Some(EntityRef::new(author_id));
    let book_id = books.save(&book).unwrap().id.unwrap();

    authors.delete_by_id(author_id).unwrap();

    let loaded = books.find_by_id(book_id).unwrap().expect("book must survive");
    assert_eq!(loaded.author, None);
}
