//! Publisher domain model.

use super::{merge_field, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// Publishing house referenced by books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Entity for Publisher {
    const KIND: EntityKind = EntityKind::Publisher;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn merge_from(&mut self, patch: &Self) {
        merge_field(&mut self.name, &patch.name);
        merge_field(&mut self.location, &patch.location);
    }
}

#[cfg(test)]
mod tests {
    use super::Publisher;
    use crate::model::Entity;

    #[test]
    fn merge_without_fields_is_a_no_op() {
        let mut existing = Publisher {
            id: Some(4),
            name: Some("Penguin".to_string()),
            location: Some("London".to_string()),
        };
        let before = existing.clone();

        existing.merge_from(&Publisher {
            id: Some(4),
            ..Publisher::default()
        });

        assert_eq!(existing, before);
    }
}
