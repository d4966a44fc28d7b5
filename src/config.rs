// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, controller, defaults};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Desired-state document describing the Ingress to create for each Service.
///
/// Only the first rule's first path is consulted; further entries are
/// accepted and ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IngressTemplate {
    pub api_version: String,
    pub kind: String,
    pub metadata: TemplateMetadata,
    pub spec: TemplateSpec,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplateMetadata {
    pub name: String,
    pub namespace: String,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSpec {
    pub ingress_class_name: String,
    pub rules: Vec<TemplateRule>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplateRule {
    pub host: String,
    pub http: TemplateHttp,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplateHttp {
    pub paths: Vec<TemplatePath>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatePath {
    pub path: String,
    pub path_type: String,
    pub backend: TemplateBackend,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplateBackend {
    pub service: TemplateBackendService,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplateBackendService {
    pub name: String,
    pub port: TemplatePort,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TemplatePort {
    pub number: Option<i32>,
}

impl IngressTemplate {
    /// Load the template from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to unmarshal YAML")
    }

    pub fn ingress_class_name(&self) -> &str {
        &self.spec.ingress_class_name
    }

    /// Host suffix appended to the Service name, empty without rules
    pub fn host(&self) -> &str {
        self.spec.rules.first().map(|r| r.host.as_str()).unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.first_path()
            .map(|p| p.path.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults::PATH)
    }

    pub fn path_type(&self) -> &str {
        self.first_path()
            .map(|p| p.path_type.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults::PATH_TYPE)
    }

    pub fn port(&self) -> i32 {
        self.first_path()
            .and_then(|p| p.backend.service.port.number)
            .unwrap_or(defaults::PORT)
    }

    fn first_path(&self) -> Option<&TemplatePath> {
        self.spec.rules.first().and_then(|r| r.http.paths.first())
    }
}

/// Immutable controller settings, built once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct Settings {
    pub template: IngressTemplate,
    /// Annotation whose presence on a Service requests an Ingress
    pub trigger_annotation: String,
    pub workers: usize,
    pub max_retries: u32,
}

impl Settings {
    pub fn new(template: IngressTemplate) -> Self {
        Self {
            template,
            trigger_annotation: annotations::INGRESS_HTTP.to_string(),
            workers: controller::WORKER_COUNT,
            max_retries: controller::MAX_RETRIES,
        }
    }
}
