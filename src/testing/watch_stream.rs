use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::watcher::{Error, Event};
use maplit::btreemap;
use std::time::Duration;

pub type WatchItem = Result<Event<Pod>, Error>;

/// Feeds watch events into a cache under test.
pub struct WatchFeed {
    sender: UnboundedSender<WatchItem>,
}

impl WatchFeed {
    pub fn new() -> (Self, UnboundedReceiver<WatchItem>) {
        let (sender, receiver) = unbounded();
        (WatchFeed { sender }, receiver)
    }

    /// Events sent after the cache dropped the stream are discarded
    pub fn send(&self, event: Event<Pod>) {
        let _ = self.sender.unbounded_send(Ok(event));
    }

    /// Sends a complete initial listing made of `pods`
    pub fn list(&self, pods: Vec<Pod>) {
        self.send(Event::Init);
        for pod in pods {
            self.send(Event::InitApply(pod));
        }
        self.send(Event::InitDone);
    }

    pub fn close(&self) {
        self.sender.close_channel();
    }
}

pub fn pod(name: &str, namespace: &str, resource_version: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(resource_version.to_string()),
            labels: Some(btreemap! {
                "app".to_string() => "web".to_string(),
            }),
            ..Default::default()
        },
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn eventually<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start_time = std::time::Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start_time.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
