pub mod cache_event;
pub mod cache_event_handler;
pub mod cache_map;
pub mod event_translator;
pub mod status;


use crate::services::backends::kubernetes::cluster_handle::ClusterHandle;
use crate::services::backends::kubernetes::watch_cache::cache_event_handler::CacheEventHandler;
use crate::services::backends::kubernetes::watch_cache::cache_event_handler::composed_event_handler::ComposedEventHandler;
use crate::services::backends::kubernetes::watch_cache::cache_event_handler::logging_event_handler::LoggingEventHandler;
use crate::services::backends::kubernetes::watch_cache::cache_map::CacheMap;
use crate::services::backends::kubernetes::watch_cache::event_translator::EventTranslator;
use crate::services::backends::kubernetes::watch_cache::status::Status;
use futures::{Stream, StreamExt};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, Resource};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cache of the pods of a single namespace.
pub type PodCache = WatchCache<Pod>;

#[derive(Clone, Debug)]
pub struct WatchCacheConfig {
    pub namespace: String,
    pub label_selector: Option<String>,
    pub sync_timeout: Duration,
}

impl Default for WatchCacheConfig {
    fn default() -> Self {
        WatchCacheConfig {
            namespace: "default".to_string(),
            label_selector: None,
            sync_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&WatchCacheConfig> for watcher::Config {
    fn from(config: &WatchCacheConfig) -> Self {
        watcher::Config {
            label_selector: config.label_selector.clone(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Synchronizing,
    Live,
    Stopped,
}

/// Point-in-time copy of the cache content.
#[derive(Debug)]
pub struct Snapshot<R> {
    pub items: Vec<Arc<R>>,
    pub state: CacheState,
}

impl<R> Snapshot<R> {
    /// False when the initial listing has not completed (or the cache was stopped),
    /// in which case `items` may be incomplete or stale.
    pub fn is_synchronized(&self) -> bool {
        self.state == CacheState::Live
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Namespace-scoped mirror of a resource type, kept up to date by a watch.
pub struct WatchCache<R>
where
    R: Resource + Send + Sync + 'static,
{
    config: WatchCacheConfig,
    map: Arc<CacheMap<R>>,
    state: Arc<watch::Sender<CacheState>>,
    cancellation: CancellationToken,
    handlers: Vec<Arc<dyn CacheEventHandler<R>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R> WatchCache<R>
where
    R: Resource + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: WatchCacheConfig) -> Self {
        let (state, _) = watch::channel(CacheState::Uninitialized);
        WatchCache {
            config,
            map: Arc::new(CacheMap::new()),
            state: Arc::new(state),
            cancellation: CancellationToken::new(),
            handlers: Vec::new(),
            worker: Mutex::new(None),
        }
    }

    /// Registers a handler notified after each change is applied to the cache
    pub fn with_handler(mut self, handler: Arc<dyn CacheEventHandler<R>>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn state(&self) -> CacheState {
        *self.state.borrow()
    }

    /// Opens the watch on the cluster and waits for the initial listing.
    pub async fn start(&self, cluster: &ClusterHandle) -> Result<(), Status>
    where
        R: Resource<Scope = NamespaceResourceScope>,
        R::DynamicType: Default,
    {
        let api: Api<R> = Api::namespaced(cluster.client(), &self.config.namespace);
        let stream = watcher(api, (&self.config).into()).default_backoff();
        self.start_with_stream(stream).await
    }

    /// Drives the cache from `stream` and blocks until the initial listing is consumed
    /// or the configured sync timeout elapses.
    ///
    /// On timeout the cache keeps synchronizing in the background and its snapshots
    /// report that they are not synchronized until the listing completes.
    pub async fn start_with_stream<S>(&self, stream: S) -> Result<(), Status>
    where
        S: Stream<Item = Result<watcher::Event<R>, watcher::Error>> + Send + 'static,
    {
        let mut current = CacheState::Uninitialized;
        let started = self.state.send_if_modified(|state| {
            current = *state;
            if *state == CacheState::Uninitialized {
                *state = CacheState::Synchronizing;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(Status::InvalidState(current));
        }
        info!("Starting watch cache for namespace {}", self.config.namespace);

        let worker = CacheWorker {
            translator: EventTranslator::new(self.config.namespace.clone(), self.map.clone()),
            handler: self.compose_handlers(),
            state: self.state.clone(),
            cancellation: self.cancellation.clone(),
        };
        let handle = tokio::spawn(worker.run(stream));
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        self.wait_for_synchronization().await
    }

    /// Copies the cached objects of the configured namespace.
    pub fn list(&self) -> Snapshot<R> {
        let state = self.state();
        let items = self
            .map
            .snapshot()
            .into_iter()
            .filter(|object| object.meta().namespace.as_deref() == Some(self.config.namespace.as_str()))
            .collect();
        Snapshot { items, state }
    }

    /// Stops the background watch. Calling it again has no effect.
    ///
    /// The worker is aborted, so an event being dispatched when `stop` is called
    /// does not reach the remaining handlers and no later event is applied.
    pub fn stop(&self) {
        self.cancellation.cancel();
        if let Some(worker) = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take() {
            worker.abort();
        }
        let previous = self.state.send_replace(CacheState::Stopped);
        if previous != CacheState::Stopped {
            info!("Watch cache for namespace {} stopped", self.config.namespace);
        }
    }

    async fn wait_for_synchronization(&self) -> Result<(), Status> {
        let mut receiver = self.state.subscribe();
        let outcome = tokio::time::timeout(
            self.config.sync_timeout,
            receiver.wait_for(|state| *state != CacheState::Synchronizing),
        )
        .await
        .map(|result| result.map(|state| *state));

        match outcome {
            Ok(Ok(CacheState::Live)) => {
                info!(
                    namespace = self.config.namespace.as_str(),
                    objects = self.map.len();
                    "Watch cache for namespace {} is synchronized", self.config.namespace);
                Ok(())
            }
            Ok(Ok(CacheState::Stopped)) | Ok(Err(_)) => Err(Status::Stopped),
            Ok(Ok(other)) => Err(Status::InvalidState(other)),
            Err(_) => {
                let message = format!(
                    "Timed out after {:?} waiting for the watch cache of namespace {} to sync",
                    self.config.sync_timeout, self.config.namespace
                );
                error!("{}", message);
                Err(Status::Timeout(message))
            }
        }
    }

    fn compose_handlers(&self) -> ComposedEventHandler<R> {
        let map: Arc<dyn CacheEventHandler<R>> = self.map.clone();
        let composed = ComposedEventHandler::new()
            .add_handler(map)
            .add_handler(Arc::new(LoggingEventHandler));
        self.handlers
            .iter()
            .fold(composed, |composed, handler| composed.add_handler(handler.clone()))
    }
}

impl<R> Drop for WatchCache<R>
where
    R: Resource + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

struct CacheWorker<R>
where
    R: Resource + Send + Sync + 'static,
{
    translator: EventTranslator<R>,
    handler: ComposedEventHandler<R>,
    state: Arc<watch::Sender<CacheState>>,
    cancellation: CancellationToken,
}

impl<R> CacheWorker<R>
where
    R: Resource + Send + Sync + 'static,
{
    async fn run<S>(mut self, stream: S)
    where
        S: Stream<Item = Result<watcher::Event<R>, watcher::Error>> + Send + 'static,
    {
        let mut stream = std::pin::pin!(stream);
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => break,
                next = stream.next() => next,
            };
            match next {
                Some(Ok(event)) => self.apply(event).await,
                Some(Err(e)) => warn!("Error processing watch event: {}", e),
                None => {
                    warn!("Watch stream ended");
                    break;
                }
            }
        }
        self.state.send_replace(CacheState::Stopped);
        debug!("Watch cache worker stopped");
    }

    async fn apply(&mut self, event: watcher::Event<R>) {
        let translation = self.translator.translate(event);
        for event in &translation.events {
            self.handler.handle(event).await;
        }
        if translation.listing_completed {
            self.state.send_if_modified(|state| {
                if *state == CacheState::Synchronizing {
                    *state = CacheState::Live;
                    true
                } else {
                    false
                }
            });
        }
    }
}
