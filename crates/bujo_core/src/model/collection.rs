//! Collection domain model.

use super::scope::{CollectionId, Scope, UserId};
use serde::{Deserialize, Serialize};

/// Named, shareable list of bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub owner_id: UserId,
    pub name: String,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl Collection {
    /// Ordering scope holding this collection's bullets.
    pub fn scope(&self) -> Scope {
        Scope::collection(self.id)
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}
