//! Route handlers.
//!
//! Each handler does its store work in one `Store::run` closure and returns
//! the post-operation state as JSON.

pub mod collection_bullets;
pub mod collections;
pub mod daily_log;
pub mod health;
pub mod preferences;
pub mod registration;
pub mod sharing;

use bujo_core::{Bullet, BulletId, BulletKind, BulletPatch, BulletState};
use serde::{Deserialize, Serialize};

/// Body for creating a bullet.
#[derive(Debug, Deserialize)]
pub struct NewBulletRequest {
    pub content: String,
    #[serde(default)]
    pub kind: BulletKind,
}

/// Body for editing a bullet.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBulletRequest {
    pub content: Option<String>,
    pub kind: Option<BulletKind>,
    pub state: Option<BulletState>,
}

impl From<UpdateBulletRequest> for BulletPatch {
    fn from(value: UpdateBulletRequest) -> Self {
        Self {
            content: value.content,
            kind: value.kind,
            state: value.state,
        }
    }
}

/// Body for reordering a scope.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub bullet_ids: Vec<BulletId>,
}

/// Ordered bullets of one scope.
#[derive(Debug, Serialize)]
pub struct BulletList {
    pub bullets: Vec<Bullet>,
}
