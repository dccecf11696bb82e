use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Named broadcast topic with bounded capacity.
/// Slow subscribers lag and lose the oldest messages rather than blocking the publisher.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    name: &'static str,
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { name, tx }
    }

    /// Returns how many subscribers the message reached.
    pub fn publish(&self, msg: T) -> usize {
        match self.tx.send(Arc::new(msg)) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!(topic = self.name, "Dropped message without subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let topic: Topic<u32> = Topic::new("numbers", 4);
        assert_eq!(topic.publish(1), 0);

        let mut a = topic.subscribe();
        let mut b = topic.subscribe();
        assert_eq!(topic.publish(2), 2);
        assert_eq!(*a.try_recv().unwrap(), 2);
        assert_eq!(*b.try_recv().unwrap(), 2);
    }
}
