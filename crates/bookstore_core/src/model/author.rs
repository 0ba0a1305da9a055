//! Author domain model.

use super::{merge_field, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// Person credited on books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.name, &patch.name);
        merge_field(&mut self.age, &patch.age);
        merge_field(&mut self.gender, &patch.gender);
    }
}
