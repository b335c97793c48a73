// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespaced object keys.
//!
//! Every object in the resource store is addressed by `namespace/name`. The
//! reconcile queue is keyed by owner keys, and jobs are resolved back to one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from building or parsing an object key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid key {0:?}: expected <namespace>/<name>")]
    Malformed(String),
    #[error("invalid key {0:?}: either namespace or name is missing")]
    MissingPart(String),
}

/// `namespace/name` identity of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey {
    namespace: String,
    name: String,
}

/// Key of a reconciled owner
pub type OwnerKey = ObjectKey;

/// Key of a background job
pub type JobKey = ObjectKey;

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, KeyError> {
        let namespace = namespace.into();
        let name = name.into();
        if namespace.is_empty() || name.is_empty() {
            return Err(KeyError::MissingPart(format!("{}/{}", namespace, name)));
        }
        if namespace.contains('/') || name.contains('/') {
            return Err(KeyError::Malformed(format!("{}/{}", namespace, name)));
        }
        Ok(Self { namespace, name })
    }

    /// Parse a `namespace/name` string.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let mut parts = key.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), None) => {
                if namespace.is_empty() || name.is_empty() {
                    Err(KeyError::MissingPart(key.to_string()))
                } else {
                    Ok(Self {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    })
                }
            }
            _ => Err(KeyError::Malformed(key.to_string())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
