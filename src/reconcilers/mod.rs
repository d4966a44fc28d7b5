// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Convergence logic for Service-derived Ingresses.

pub mod builder;
pub mod service;

pub use builder::build_ingress;
pub use service::{wants_ingress, Outcome, ServiceReconciler};
