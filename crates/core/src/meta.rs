// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object metadata shared by every stored resource

use crate::id::Uid;
use crate::key::{KeyError, ObjectKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Back-reference from a dependent object to the object that created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
    pub uid: Uid,
    /// Set on the single reference that identifies the managing controller
    #[serde(default)]
    pub controller: bool,
}

/// Store-managed metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: Uid,
    /// Bumped by the store on every spec change and on deletion request
    #[serde(default)]
    pub generation: u64,
    /// Optimistic-concurrency token, bumped on every write
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> Result<ObjectKey, KeyError> {
        ObjectKey::new(&self.namespace, &self.name)
    }

    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp_ms.is_some()
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Adds the finalizer if missing. Returns true when the list changed.
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.finalizers.push(finalizer.to_string());
        true
    }

    /// Removes the finalizer if present. Returns true when the list changed.
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        self.finalizers.len() != before
    }

    /// The reference marked as the managing controller, if any
    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.controller)
    }
}

/// Anything the resource store holds
pub trait Resource: Clone + Send + Sync + 'static {
    /// Kind name used in owner references and logs
    const KIND: &'static str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn key(&self) -> Result<ObjectKey, KeyError> {
        self.meta().key()
    }
}
