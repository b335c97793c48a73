// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status conditions.
//!
//! The engine speaks a generic three-state vocabulary
//! (processing / processed / failed) which the cluster strategy maps onto
//! direction-specific condition types. Conditions are stored as an ordered
//! set keyed by type, so a type appears at most once.

use crate::cluster::Direction;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Condition types exposed in a cluster's status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterConditionType {
    Provisioning,
    Provisioned,
    ProvisioningFailed,
    Deprovisioning,
    Deprovisioned,
    DeprovisioningFailed,
}

impl fmt::Display for ClusterConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Generic job lifecycle condition used by the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobSyncCondition {
    Processing,
    Processed,
    ProcessingFailed,
}

impl JobSyncCondition {
    pub fn for_direction(self, direction: Direction) -> ClusterConditionType {
        use ClusterConditionType as C;
        match (self, direction) {
            (JobSyncCondition::Processing, Direction::Provision) => C::Provisioning,
            (JobSyncCondition::Processed, Direction::Provision) => C::Provisioned,
            (JobSyncCondition::ProcessingFailed, Direction::Provision) => C::ProvisioningFailed,
            (JobSyncCondition::Processing, Direction::Deprovision) => C::Deprovisioning,
            (JobSyncCondition::Processed, Direction::Deprovision) => C::Deprovisioned,
            (JobSyncCondition::ProcessingFailed, Direction::Deprovision) => {
                C::DeprovisioningFailed
            }
        }
    }
}

/// Decides whether a same-status condition update is applied.
///
/// A status change is always applied; this only governs re-application of
/// an unchanged status.
#[derive(Clone, Copy)]
pub enum UpdateCheck {
    Always,
    IfReasonOrMessageChange,
    Never,
    /// `(old_reason, old_message, new_reason, new_message) -> apply?`
    Custom(fn(&str, &str, &str, &str) -> bool),
}

impl UpdateCheck {
    pub fn should_update(
        &self,
        old_reason: &str,
        old_message: &str,
        new_reason: &str,
        new_message: &str,
    ) -> bool {
        match self {
            UpdateCheck::Always => true,
            UpdateCheck::IfReasonOrMessageChange => {
                old_reason != new_reason || old_message != new_message
            }
            UpdateCheck::Never => false,
            UpdateCheck::Custom(check) => check(old_reason, old_message, new_reason, new_message),
        }
    }
}

impl fmt::Debug for UpdateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateCheck::Always => write!(f, "Always"),
            UpdateCheck::IfReasonOrMessageChange => write!(f, "IfReasonOrMessageChange"),
            UpdateCheck::Never => write!(f, "Never"),
            UpdateCheck::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ClusterConditionType,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_probe_ms: u64,
    pub last_transition_ms: u64,
}

/// Ordered set of conditions, unique by type.
///
/// Serialized as a list; a duplicated type in input keeps the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Condition>", into = "Vec<Condition>")]
pub struct Conditions(IndexMap<ClusterConditionType, Condition>);

impl From<Vec<Condition>> for Conditions {
    fn from(list: Vec<Condition>) -> Self {
        Self(list.into_iter().map(|c| (c.condition_type, c)).collect())
    }
}

impl From<Conditions> for Vec<Condition> {
    fn from(conditions: Conditions) -> Self {
        conditions.0.into_values().collect()
    }
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, condition_type: ClusterConditionType) -> Option<&Condition> {
        self.0.get(&condition_type)
    }

    /// True when the condition exists with status `True`
    pub fn is_true(&self, condition_type: ClusterConditionType) -> bool {
        self.get(condition_type)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Upsert a condition. Returns true if anything changed.
    ///
    /// A missing condition is only recorded when it is `True`. The transition
    /// timestamp moves only when the status changes; the probe timestamp moves
    /// on every applied update.
    pub fn set(
        &mut self,
        condition_type: ClusterConditionType,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        check: UpdateCheck,
        now_ms: u64,
    ) -> bool {
        match self.0.get_mut(&condition_type) {
            None => {
                if status != ConditionStatus::True {
                    return false;
                }
                self.0.insert(
                    condition_type,
                    Condition {
                        condition_type,
                        status,
                        reason: reason.to_string(),
                        message: message.to_string(),
                        last_probe_ms: now_ms,
                        last_transition_ms: now_ms,
                    },
                );
                true
            }
            Some(existing) => {
                let status_changed = existing.status != status;
                if !status_changed
                    && !check.should_update(&existing.reason, &existing.message, reason, message)
                {
                    return false;
                }
                if status_changed {
                    existing.last_transition_ms = now_ms;
                }
                existing.status = status;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
                existing.last_probe_ms = now_ms;
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
