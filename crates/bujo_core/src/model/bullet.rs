//! Bullet domain model.
//!
//! # Responsibility
//! - Define the journal item stored in collections and daily logs.
//! - Provide the closed sets of bullet kinds and states.
//!
//! # Invariants
//! - `content` is never blank after trimming.
//! - `position` is unique within the bullet's scope; it carries no meaning
//!   beyond relative order.

use super::scope::{Scope, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a bullet.
pub type BulletId = Uuid;

/// Rapid-logging signifier of a bullet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletKind {
    /// Actionable item.
    #[default]
    Task,
    /// Free-form note.
    Note,
    /// Something that happened or is scheduled.
    Event,
}

impl BulletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
            Self::Event => "event",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task" => Some(Self::Task),
            "note" => Some(Self::Note),
            "event" => Some(Self::Event),
            _ => None,
        }
    }
}

/// Lifecycle state of a bullet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletState {
    #[default]
    Open,
    Complete,
    /// Carried over to another log or collection.
    Migrated,
    /// No longer relevant.
    Cancelled,
}

impl BulletState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Complete => "complete",
            Self::Migrated => "migrated",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "complete" => Some(Self::Complete),
            "migrated" => Some(Self::Migrated),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Persisted bullet read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: BulletId,
    pub scope: Scope,
    pub kind: BulletKind,
    pub content: String,
    pub state: BulletState,
    /// Ordering key within `scope`.
    pub position: i64,
    /// User who wrote the bullet. Unchanged by moves.
    pub created_by: UserId,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

/// Input for creating one bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletDraft {
    pub kind: BulletKind,
    pub content: String,
}

impl BulletDraft {
    pub fn new(kind: BulletKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// Creates a task draft, the default signifier.
    pub fn task(content: impl Into<String>) -> Self {
        Self::new(BulletKind::Task, content)
    }

    /// Trims content and rejects blank input.
    pub fn normalized(self) -> Result<Self, BulletValidationError> {
        Ok(Self {
            kind: self.kind,
            content: normalize_content(&self.content)?,
        })
    }
}

/// Partial edit of one bullet. Scope and position are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulletPatch {
    pub content: Option<String>,
    pub kind: Option<BulletKind>,
    pub state: Option<BulletState>,
}

impl BulletPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.kind.is_none() && self.state.is_none()
    }
}

/// Validation failures for bullet input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulletValidationError {
    BlankContent,
}

impl Display for BulletValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankContent => write!(f, "bullet content must not be blank"),
        }
    }
}

impl Error for BulletValidationError {}

/// Trims bullet content and rejects blank values.
pub fn normalize_content(value: &str) -> Result<String, BulletValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BulletValidationError::BlankContent);
    }
    Ok(trimmed.to_string())
}
