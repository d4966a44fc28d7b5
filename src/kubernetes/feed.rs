// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch + cache feed turning raw watch events into typed lifecycle events.

use futures::StreamExt;
use kube::{Api, Resource};
use kube_runtime::reflector::{store::Writer, ObjectRef, Store};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle notification for one object
#[derive(Debug, Clone)]
pub enum ResourceEvent<K> {
    Added(Arc<K>),
    Updated(Arc<K>, Arc<K>),
    Deleted(Arc<K>),
}

/// Applies watch events to the cache and derives add/update/delete
/// notifications from what the cache held before.
pub struct EventTranslator<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    writer: Writer<K>,
    /// Objects seen since the current relist began
    relisted: Option<HashSet<ObjectRef<K>>>,
}

impl<K> EventTranslator<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            writer: Writer::new(K::DynamicType::default()),
            relisted: None,
        }
    }

    /// Read handle on the cache this translator maintains
    pub fn store(&self) -> Store<K> {
        self.writer.as_reader()
    }

    pub fn apply(&mut self, event: watcher::Event<K>) -> Vec<ResourceEvent<K>> {
        let reader = self.writer.as_reader();
        let mut out = Vec::new();

        match &event {
            watcher::Event::Apply(obj) => {
                out.push(Self::applied(&reader, obj));
            }
            watcher::Event::Delete(obj) => {
                let current = reader
                    .get(&ObjectRef::from_obj(obj))
                    .unwrap_or_else(|| Arc::new(obj.clone()));
                out.push(ResourceEvent::Deleted(current));
            }
            watcher::Event::Init => {
                self.relisted = Some(HashSet::new());
            }
            watcher::Event::InitApply(obj) => {
                if let Some(seen) = self.relisted.as_mut() {
                    seen.insert(ObjectRef::from_obj(obj));
                }
                out.push(Self::applied(&reader, obj));
            }
            watcher::Event::InitDone => {
                // Anything cached but absent from the relist was deleted while we were away
                let seen = self.relisted.take().unwrap_or_default();
                for obj in reader.state() {
                    if !seen.contains(&ObjectRef::from_obj(obj.as_ref())) {
                        debug!("Object missing from relist, treating as deleted");
                        out.push(ResourceEvent::Deleted(obj));
                    }
                }
            }
        }

        self.writer.apply_watcher_event(&event);
        out
    }

    fn applied(reader: &Store<K>, obj: &K) -> ResourceEvent<K> {
        let current = Arc::new(obj.clone());
        match reader.get(&ObjectRef::from_obj(obj)) {
            Some(previous) => ResourceEvent::Updated(previous, current),
            None => ResourceEvent::Added(current),
        }
    }
}

impl<K> Default for EventTranslator<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Watches one kind and feeds its lifecycle events to a handler.
pub struct ChangeFeed<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    api: Api<K>,
    config: watcher::Config,
    translator: EventTranslator<K>,
}

impl<K> ChangeFeed<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    pub fn new(api: Api<K>) -> Self {
        Self {
            api,
            config: watcher::Config::default(),
            translator: EventTranslator::new(),
        }
    }

    pub fn store(&self) -> Store<K> {
        self.translator.store()
    }

    /// Drive the watch until the stream ends, reconnecting with backoff on errors
    pub async fn run<F>(self, mut handler: F)
    where
        F: FnMut(ResourceEvent<K>),
    {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        let ChangeFeed {
            api,
            config,
            mut translator,
        } = self;

        info!("Starting {} watch", kind);
        let mut stream = watcher(api, config).default_backoff().boxed();
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    for notification in translator.apply(event) {
                        handler(notification);
                    }
                }
                Err(e) => warn!("{} watch error: {}", kind, e),
            }
        }
        warn!("{} watch stream ended", kind);
    }
}
