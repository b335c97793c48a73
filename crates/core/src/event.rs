// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifications delivered by the resource store's watch streams

/// Final state of a deleted object.
///
/// A watch that missed the actual deletion only knows the object's key and,
/// possibly, the last state it observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Deleted<T> {
    Live(T),
    Tombstone { key: String, last_known: Option<T> },
}

impl<T> Deleted<T> {
    /// Recover the deleted object, or the tombstone key if nothing is known.
    pub fn into_object(self) -> Result<T, String> {
        match self {
            Deleted::Live(obj) => Ok(obj),
            Deleted::Tombstone {
                last_known: Some(obj),
                ..
            } => Ok(obj),
            Deleted::Tombstone {
                key,
                last_known: None,
            } => Err(key),
        }
    }
}

/// One notification from a watch stream
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<T> {
    Added(T),
    Updated { old: T, new: T },
    Deleted(Deleted<T>),
    /// The initial listing has been delivered; the cache is warm
    Synced,
}

impl<T> WatchEvent<T> {
    pub fn name(&self) -> &'static str {
        match self {
            WatchEvent::Added(_) => "added",
            WatchEvent::Updated { .. } => "updated",
            WatchEvent::Deleted(_) => "deleted",
            WatchEvent::Synced => "synced",
        }
    }
}
