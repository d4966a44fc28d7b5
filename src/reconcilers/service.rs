// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service reconciler - converges the Ingress of one Service key.

use crate::config::Settings;
use crate::error::{is_not_found, Result};
use crate::kubernetes::keys::split_key;
use crate::reconcilers::builder::build_ingress;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    api::{DeleteParams, PostParams},
    runtime::reflector::{ObjectRef, Store},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a reconcile pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The Service is gone; cascade deletion handles its Ingress
    ServiceGone,
    Created,
    Deleted,
    /// Already converged, no API call made
    Unchanged,
}

/// Check if the Service carries the trigger annotation, whatever its value
pub fn wants_ingress(service: &Service, annotation: &str) -> bool {
    service.annotations().contains_key(annotation)
}

pub struct ServiceReconciler {
    client: Client,
    services: Store<Service>,
    ingresses: Store<Ingress>,
    settings: Arc<Settings>,
}

impl ServiceReconciler {
    pub fn new(
        client: Client,
        services: Store<Service>,
        ingresses: Store<Ingress>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            client,
            services,
            ingresses,
            settings,
        }
    }

    /// Make the Ingress for `key` exist iff its Service exists and is annotated.
    ///
    /// Makes at most one create or delete call. An existing Ingress is left as
    /// is even if it differs from the template.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, key: &str) -> Result<Outcome> {
        let (namespace, name) = split_key(key)?;

        let Some(service) = self.services.get(&ObjectRef::new(name).within(namespace)) else {
            info!("Service {}/{} not found, nothing to do", namespace, name);
            return Ok(Outcome::ServiceGone);
        };

        let wanted = wants_ingress(&service, &self.settings.trigger_annotation);
        let existing = self.ingresses.get(&ObjectRef::new(name).within(namespace));

        match (wanted, existing) {
            (true, None) => self.create(&service).await,
            (false, Some(ingress)) => self.delete(namespace, &ingress.name_any()).await,
            (true, Some(_)) => {
                debug!("Ingress {}/{} already present", namespace, name);
                Ok(Outcome::Unchanged)
            }
            (false, None) => {
                debug!("Service {}/{} has no ingress annotation", namespace, name);
                Ok(Outcome::Unchanged)
            }
        }
    }

    async fn create(&self, service: &Service) -> Result<Outcome> {
        let namespace = service.namespace().unwrap_or_default();
        let ingress = build_ingress(service, &self.settings.template);
        let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), &namespace);

        ingresses.create(&PostParams::default(), &ingress).await?;
        info!(
            "Ingress created: ingress={} namespace={}",
            service.name_any(),
            namespace
        );
        Ok(Outcome::Created)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<Outcome> {
        let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);

        match ingresses.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Ingress deleted: ingress={} namespace={}", name, namespace);
                Ok(Outcome::Deleted)
            }
            Err(e) if is_not_found(&e) => {
                debug!("Ingress {}/{} already deleted", namespace, name);
                Ok(Outcome::Unchanged)
            }
            Err(e) => Err(e.into()),
        }
    }
}
