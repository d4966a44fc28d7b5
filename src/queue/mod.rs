// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating, rate-limited work queue of `namespace/name` keys.

pub mod rate_limiter;
pub mod work_queue;

pub use rate_limiter::{
    BucketRateLimiter, ItemExponentialRateLimiter, MaxOfRateLimiter, RateLimiter,
};
pub use work_queue::WorkQueue;
