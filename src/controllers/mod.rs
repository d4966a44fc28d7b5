// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event dispatch and the worker pool that drives reconciliation.

pub mod controller;
pub mod dispatcher;

pub use controller::Controller;
pub use dispatcher::{decision_relevant_changed, EventDispatcher};
