// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock API server behind a real `kube::Client`, and
//! fixtures for Services, Ingresses and caches.

use crate::config::{IngressTemplate, Settings};
use crate::error::{ControllerError, ErrorReporter};
use http::{Request, Response};
use k8s_openapi::api::core::v1::Service;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::runtime::reflector::{store::Writer, Store};
use kube::runtime::watcher;
use kube::{Client, Resource};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service as TowerService;

type Responses = HashMap<(String, String), (u16, String)>;

/// A mock HTTP service that returns predefined responses based on request
/// paths and records every request it receives.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<Responses>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    latency: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `method` requests whose path starts with `path`
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of requests that were being served at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests seen so far as `(method, path)`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests with this method
    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        responses
            .iter()
            .find(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .map(|(_, resp)| resp.clone())
    }
}

impl TowerService<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        let latency = self.latency;
        let in_flight = self.in_flight.clone();
        let max_in_flight = self.max_in_flight.clone();

        Box::pin(async move {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Status failure body with the given code
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Minimal Ingress body as returned by a successful create or delete
pub fn ingress_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "ingress-uid"
        }
    })
    .to_string()
}

pub fn ingress_path(namespace: &str) -> String {
    format!("/apis/networking.k8s.io/v1/namespaces/{}/ingresses", namespace)
}

pub fn make_service(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            annotations: Some(
                annotations
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Template routing `<name>.example.com/` to port 8080 through class `nginx`
pub fn make_settings() -> Arc<Settings> {
    let template = IngressTemplate::from_yaml(
        r#"
spec:
  ingressClassName: nginx
  rules:
    - host: .example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: placeholder
                port:
                  number: 8080
"#,
    )
    .unwrap();
    Arc::new(Settings::new(template))
}

/// A reflector cache pre-filled with `objects`
pub fn make_store<K>(objects: Vec<K>) -> (Store<K>, Writer<K>)
where
    K: Resource + Clone + 'static,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let mut writer = Writer::new(K::DynamicType::default());
    for obj in objects {
        writer.apply_watcher_event(&watcher::Event::Apply(obj));
    }
    (writer.as_reader(), writer)
}

/// Reporter that keeps every report for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, key: &str, error: &ControllerError) {
        self.reports
            .lock()
            .unwrap()
            .push((key.to_string(), error.to_string()));
    }
}
