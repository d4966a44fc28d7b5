// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid work key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, ControllerError>;

/// Returns true when the API server answered 404 for this call
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// Sink for errors on keys the controller has given up on.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, key: &str, error: &ControllerError);
}

/// Default reporter, writes dropped keys to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, key: &str, error: &ControllerError) {
        error!(key = %key, "Dropping key after repeated failures: {}", error);
    }
}
