// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds the Ingress a Service should have

use crate::config::IngressTemplate;
use crate::kubernetes::owner::service_controller_ref;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use kube::{api::ObjectMeta, ResourceExt};

/// Ingress named after `service`, in its namespace, controlled by it and
/// routing `<name><host suffix><path>` to the service port from the template.
pub fn build_ingress(service: &Service, template: &IngressTemplate) -> Ingress {
    let name = service.name_any();

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: service.namespace(),
            owner_references: Some(vec![service_controller_ref(service)]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(template.ingress_class_name().to_string()),
            rules: Some(vec![IngressRule {
                host: Some(format!("{}{}", name, template.host())),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some(template.path().to_string()),
                        path_type: template.path_type().to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name,
                                port: Some(ServiceBackendPort {
                                    number: Some(template.port()),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
