//! Deterministic selection among listed vaults, keys and contracts
//!
//! Listing services make no ordering guarantee, so "take the first element"
//! is replaced by an explicit policy over creation time. Records without a
//! creation time always sort after records with one; remaining ties are
//! broken by identifier so the outcome never depends on listing order.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A record returned by a listing call
pub trait Listed {
    /// Stable identifier used as the final tie-breaker
    fn listing_id(&self) -> &str;

    /// When the record was created, if the service reports it
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// Policy for picking one record out of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Oldest record first
    #[default]
    EarliestCreated,
    /// Newest record first
    LatestCreated,
}

impl SelectionPolicy {
    /// Pick one record, or `None` if the listing is empty
    pub fn select<T: Listed>(&self, items: Vec<T>) -> Option<T> {
        let mut items = items;
        items.sort_by(|a, b| self.compare(a, b));
        items.into_iter().next()
    }

    fn compare<T: Listed>(&self, a: &T, b: &T) -> Ordering {
        let by_time = match (a.created_at(), b.created_at()) {
            (Some(x), Some(y)) => match self {
                SelectionPolicy::EarliestCreated => x.cmp(&y),
                SelectionPolicy::LatestCreated => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time.then_with(|| a.listing_id().cmp(b.listing_id()))
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::EarliestCreated => write!(f, "earliest"),
            SelectionPolicy::LatestCreated => write!(f, "latest"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "earliest" | "earliest-created" | "oldest" => Ok(SelectionPolicy::EarliestCreated),
            "latest" | "latest-created" | "newest" => Ok(SelectionPolicy::LatestCreated),
            _ => Err(format!("Unknown selection policy: {}", s)),
        }
    }
}
