use crate::model::bullet::BulletId;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// New key for one bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAssignment {
    pub bullet_id: BulletId,
    pub position: i64,
}

/// Why a requested order was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidOrderReason {
    /// The same bullet appears more than once.
    Duplicate(BulletId),
    /// The bullet is not a current member of the scope.
    NotMember(BulletId),
}

impl Display for InvalidOrderReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "bullet listed more than once: {id}"),
            Self::NotMember(id) => write!(f, "bullet is not in this scope: {id}"),
        }
    }
}

/// Plans a full or partial reorder of a scope.
///
/// `current` is the scope in stored order. Listed bullets are written back
/// into the slots they occupied before, in `requested` order; unlisted
/// bullets keep their keys. Only assignments that change a key are returned,
/// so an empty request is a no-op.
pub fn plan_reorder(
    current: &[(BulletId, i64)],
    requested: &[BulletId],
) -> Result<Vec<PositionAssignment>, InvalidOrderReason> {
    let members: HashSet<BulletId> = current.iter().map(|(id, _)| *id).collect();
    let mut listed = HashSet::with_capacity(requested.len());
    for id in requested {
        if !members.contains(id) {
            return Err(InvalidOrderReason::NotMember(*id));
        }
        if !listed.insert(*id) {
            return Err(InvalidOrderReason::Duplicate(*id));
        }
    }

    let occupied = current.iter().filter(|(id, _)| listed.contains(id));

    Ok(requested
        .iter()
        .zip(occupied)
        .filter(|(id, (previous_id, _))| *id != previous_id)
        .map(|(id, (_, slot))| PositionAssignment {
            bullet_id: *id,
            position: *slot,
        })
        .collect())
}
