// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller owner references on managed Ingresses

use crate::constants::SERVICE_KIND;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

/// Kind of the controlling owner, resolved once from the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKind {
    Service,
    Other(String),
}

impl OwnerKind {
    fn from_reference(owner: &OwnerReference) -> Self {
        if owner.kind == SERVICE_KIND && owner.api_version == "v1" {
            OwnerKind::Service
        } else {
            OwnerKind::Other(owner.kind.clone())
        }
    }
}

/// The owner reference flagged as controller, with its resolved kind
pub fn controller_owner<K: Resource>(obj: &K) -> Option<(OwnerKind, &OwnerReference)> {
    obj.owner_references()
        .iter()
        .find(|r| r.controller == Some(true))
        .map(|r| (OwnerKind::from_reference(r), r))
}

/// Controller reference pointing at `service`
pub fn service_controller_ref(service: &Service) -> OwnerReference {
    OwnerReference {
        api_version: Service::api_version(&()).to_string(),
        kind: Service::kind(&()).to_string(),
        name: service.name_any(),
        uid: service.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}
