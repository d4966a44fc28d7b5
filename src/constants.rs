// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by the ingress manager
pub mod annotations {
    /// Presence (any value) on a Service requests a managed Ingress
    pub const INGRESS_HTTP: &str = "ingress/http";
}

/// Controller tunables, fixed at start
pub mod controller {
    /// Number of concurrent worker loops draining the queue
    pub const WORKER_COUNT: usize = 5;
    /// Failed attempts tolerated before a key is dropped
    pub const MAX_RETRIES: u32 = 5;
}

/// Work queue rate limiting defaults
pub mod rate_limit {
    /// Per-key backoff for the first failure, in milliseconds
    pub const BASE_DELAY_MS: u64 = 5;
    /// Per-key backoff cap, in seconds
    pub const MAX_DELAY_SECS: u64 = 1000;
    /// Overall token bucket refill rate (keys per second)
    pub const BUCKET_QPS: f64 = 10.0;
    /// Overall token bucket size
    pub const BUCKET_BURST: u32 = 100;
}

/// Defaults applied when the desired-state file omits a value
pub mod defaults {
    pub const CONFIG_PATH: &str = "config/ingress.yaml";
    pub const PATH: &str = "/";
    pub const PATH_TYPE: &str = "Prefix";
    pub const PORT: i32 = 80;
}

/// Kind recorded on owner references of managed Ingresses
pub const SERVICE_KIND: &str = "Service";
