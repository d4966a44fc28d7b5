// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes plumbing: work keys, owner references and the watch/cache feed.

pub mod feed;
pub mod keys;
pub mod owner;

pub use feed::{ChangeFeed, ResourceEvent};
pub use keys::{key_for, split_key};
pub use owner::{controller_owner, OwnerKind};
