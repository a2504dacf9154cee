//! Migration IDs and human-readable field notes.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Sortable migration ID / filename discriminator: `YYYYMMDDHHmmss`.
pub const ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Note appended to generated struct fields.
pub const NOTE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn id(&self) -> String {
        self.0.format(ID_FORMAT).to_string()
    }

    pub fn note(&self) -> String {
        self.0.format(NOTE_FORMAT).to_string()
    }
}

/// First ID at or after `base` that is not in `used`.
///
/// IDs are compared as numbers so `20260101120059` bumps to `20260101120060`;
/// the result only has to sort after its predecessors, not be a valid clock
/// reading.
pub fn next_free_id(base: &str, used: &HashSet<String>) -> String {
    let Ok(mut n) = base.parse::<u64>() else {
        return base.to_string();
    };
    while used.contains(&n.to_string()) {
        n += 1;
    }
    n.to_string()
}
