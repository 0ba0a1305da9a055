//! Book domain model.
//!
//! # Invariants
//! - `stores` is the non-owning side of the store/book association and
//!   always mirrors the join table.
//! - `author` and `publisher` point at existing records or are `None`.

use super::{merge_field, ref_ids, Entity, EntityId, EntityKind, EntityRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A catalog title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Option<EntityId>,
    pub title: Option<String>,
    pub page_no: Option<i64>,
    pub author: Option<EntityRef>,
    pub publisher: Option<EntityRef>,
    /// Filled on reads; ignored when the book is saved.
    #[serde(default)]
    pub stores: BTreeSet<EntityRef>,
}

impl Book {
    /// Creates an unsaved book with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Ids of the stores carrying this book.
    pub fn store_ids(&self) -> BTreeSet<EntityId> {
        ref_ids(&self.stores)
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.title, &patch.title);
        merge_field(&mut self.page_no, &patch.page_no);
    }
}

#[cfg(test)]
mod tests {
    use super::Book;
    use crate::model::{Entity, EntityRef};

    #[test]
    fn serializes_with_camel_case_fields() {
        let book = Book {
            id: Some(2),
            title: Some("Foo".to_string()),
            page_no: Some(120),
            author: Some(EntityRef::new(5)),
            ..Book::default()
        };

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["pageNo"], 120);
        assert_eq!(json["author"]["id"], 5);
        assert!(json["publisher"].is_null());
        assert_eq!(json["stores"], serde_json::json!([]));
    }

    #[test]
    fn merge_keeps_relations() {
        let mut existing = Book::titled("old");
        existing.author = Some(EntityRef::new(1));
        let patch = Book {
            page_no: Some(10),
            author: Some(EntityRef::new(9)),
            ..Book::default()
        };

        existing.merge_from(&patch);

        assert_eq!(existing.title.as_deref(), Some("old"));
        assert_eq!(existing.page_no, Some(10));
        assert_eq!(existing.author, Some(EntityRef::new(1)));
    }
}
