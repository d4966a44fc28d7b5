// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `namespace/name` work keys

use crate::error::{ControllerError, Result};
use kube::{Resource, ResourceExt};

/// Work key for an object: `namespace/name`, or just `name` when cluster scoped
pub fn key_for<K: Resource>(obj: &K) -> String {
    let name = obj.name_any();
    match obj.namespace() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name,
    }
}

/// Split a work key into `(namespace, name)`. A bare name yields an empty namespace.
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) if !name.is_empty() => Ok(("", name)),
        (Some(ns), Some(name), None) if !name.is_empty() => Ok((ns, name)),
        _ => Err(ControllerError::InvalidKey(format!(
            "unexpected key format: {:?}",
            key
        ))),
    }
}
