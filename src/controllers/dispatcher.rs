// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns Service and Ingress lifecycle events into work keys.

use crate::config::Settings;
use crate::kubernetes::feed::ResourceEvent;
use crate::kubernetes::keys::key_for;
use crate::kubernetes::owner::{controller_owner, OwnerKind};
use crate::queue::WorkQueue;
use crate::reconcilers::service::wants_ingress;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, trace};

/// True when an update can change the reconcile decision for a Service.
///
/// Only the presence of the trigger annotation matters; resource versions,
/// status and other metadata churn are ignored.
pub fn decision_relevant_changed(old: &Service, new: &Service, annotation: &str) -> bool {
    wants_ingress(old, annotation) != wants_ingress(new, annotation)
}

pub struct EventDispatcher {
    queue: WorkQueue,
    settings: Arc<Settings>,
}

impl EventDispatcher {
    pub fn new(queue: WorkQueue, settings: Arc<Settings>) -> Self {
        Self { queue, settings }
    }

    pub fn on_service_event(&self, event: ResourceEvent<Service>) {
        match event {
            ResourceEvent::Added(service) => self.queue.add(key_for(service.as_ref())),
            ResourceEvent::Updated(old, new) => {
                if decision_relevant_changed(&old, &new, &self.settings.trigger_annotation) {
                    self.queue.add(key_for(new.as_ref()));
                } else {
                    trace!("Service {} updated without annotation change", key_for(new.as_ref()));
                }
            }
            // Owned Ingresses go away through cascade deletion
            ResourceEvent::Deleted(_) => {}
        }
    }

    pub fn on_ingress_event(&self, event: ResourceEvent<Ingress>) {
        let ResourceEvent::Deleted(ingress) = event else {
            return;
        };

        match controller_owner(ingress.as_ref()) {
            Some((OwnerKind::Service, owner)) => {
                let key = match ingress.namespace() {
                    Some(ns) => format!("{}/{}", ns, owner.name),
                    None => owner.name.clone(),
                };
                debug!("Managed ingress {} deleted, requeueing owner {}", key_for(ingress.as_ref()), key);
                self.queue.add(key);
            }
            Some((OwnerKind::Other(kind), _)) => {
                trace!("Ingress {} is owned by a {}, ignoring", key_for(ingress.as_ref()), kind);
            }
            None => {}
        }
    }
}
