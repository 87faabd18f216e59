/// Spacing between keys of a freshly normalized scope.
pub const POSITION_GAP: i64 = 1024;

/// Where a moved bullet lands in its destination scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Zero-based index among the destination's other members, clamped.
    Index(usize),
    End,
}

impl MoveTarget {
    /// Resolves the target against a destination holding `len` other members.
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Self::Index(index) => index.min(len),
            Self::End => len,
        }
    }
}

impl From<Option<usize>> for MoveTarget {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::End, Self::Index)
    }
}

/// Key decision for inserting one bullet into a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPlan {
    /// The key fits between the current neighbors.
    Fits(i64),
    /// No integer is free at the target index. `positions` re-encodes the
    /// existing members in their current order; `position` is the new
    /// bullet's key relative to that re-encoding.
    Renormalize { positions: Vec<i64>, position: i64 },
}

impl InsertPlan {
    pub fn position(&self) -> i64 {
        match self {
            Self::Fits(position) => *position,
            Self::Renormalize { position, .. } => *position,
        }
    }
}

/// Plans the key for a bullet inserted at `index` among `existing` keys.
///
/// `index` is clamped to `existing.len()`, which means "append".
pub fn plan_insert(existing: &[i64], index: usize) -> InsertPlan {
    debug_assert!(is_strictly_ascending(existing));
    let index = index.min(existing.len());
    let lower = if index == 0 { 0 } else { existing[index - 1] };

    if let Some(position) = key_between(lower, existing.get(index).copied()) {
        return InsertPlan::Fits(position);
    }

    let positions = renormalized_positions(existing.len());
    let position = if index == positions.len() {
        gap_key(positions.len() + 1)
    } else {
        gap_key(index) + POSITION_GAP / 2
    };
    InsertPlan::Renormalize {
        positions,
        position,
    }
}

/// Evenly spaced keys for `len` members: `GAP, 2 * GAP, ...`.
pub fn renormalized_positions(len: usize) -> Vec<i64> {
    (1..=len).map(gap_key).collect()
}

fn gap_key(slot: usize) -> i64 {
    (slot as i64).saturating_mul(POSITION_GAP)
}

fn key_between(lower: i64, upper: Option<i64>) -> Option<i64> {
    match upper {
        Some(upper) if upper - lower < 2 => None,
        Some(upper) => Some(lower + (upper - lower) / 2),
        None => lower.checked_add(POSITION_GAP),
    }
}

fn is_strictly_ascending(keys: &[i64]) -> bool {
    keys.windows(2).all(|pair| pair[0] < pair[1]) && keys.first().map_or(true, |key| *key > 0)
}
