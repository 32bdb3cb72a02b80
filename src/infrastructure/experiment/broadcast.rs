//! Broadcast relay for experiment lifecycle events

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::experiment::{ExperimentEvent, ExperimentObserver};

/// Default channel capacity; slower receivers see `Lagged` and skip ahead
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Observer that fans events out to any number of tokio receivers
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<ExperimentEvent>,
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExperimentEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ExperimentObserver for BroadcastObserver {
    fn notify(&self, event: &ExperimentEvent) {
        // No receivers is the normal idle state
        if self.sender.send(event.clone()).is_err() {
            trace!(event = event.event_type(), "No event subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::ExperimentName;

    fn reset_event(name: &str) -> ExperimentEvent {
        ExperimentEvent::DidReset {
            name: ExperimentName::new(name).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let observer = BroadcastObserver::default();
        let mut first = observer.subscribe();
        let mut second = observer.subscribe();

        observer.notify(&reset_event("hero"));

        assert_eq!(first.recv().await.unwrap(), reset_event("hero"));
        assert_eq!(second.recv().await.unwrap(), reset_event("hero"));
    }

    #[test]
    fn test_notify_without_subscribers_is_silent() {
        let observer = BroadcastObserver::new(4);
        assert_eq!(observer.receiver_count(), 0);

        observer.notify(&reset_event("hero"));
    }

    #[tokio::test]
    async fn test_lagging_receiver() {
        let observer = BroadcastObserver::new(1);
        let mut rx = observer.subscribe();

        observer.notify(&reset_event("a"));
        observer.notify(&reset_event("b"));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap(), reset_event("b"));
    }
}
