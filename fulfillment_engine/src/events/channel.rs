//! Stateless pub-sub event plumbing.
//!
//! This is the in-process stand-in for the message bus: producers publish typed events into a
//! channel, and a single handler task fans each event out to a spawned job. Handlers receive
//! only the event itself; any state they need must travel in their closure. Delivery is
//! at-least-once from the consumer's point of view, so every handler registered here must be
//! idempotent.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs the dispatch loop until every producer has been dropped, then waits for in-flight
    /// jobs to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Drop our own sender so the loop ends once the last subscriber goes away.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(event) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move {
                (handler)(event).await;
                trace!("📬️ Event handled");
            });
            // Reap whatever has already finished so the set does not grow unbounded.
            while let Some(completed) = jobs.try_join_next() {
                if let Err(e) = completed {
                    warn!("📬️ Event handler job panicked: {e}");
                }
            }
        }
        while let Some(completed) = jobs.join_next().await {
            if let Err(e) = completed {
                warn!("📬️ Event handler job panicked: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn all_published_events_are_handled() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicU64::new(0));
        let sum = total.clone();
        let handler = Arc::new(move |v: u64| {
            let sum = sum.clone();
            Box::pin(async move {
                sum.fetch_add(v, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(4, handler);
        let producer_a = event_handler.subscribe();
        let producer_b = event_handler.subscribe();
        tokio::spawn(async move {
            for i in 0..10u64 {
                producer_a.publish_event(i).await;
            }
        });
        tokio::spawn(async move {
            for i in 10..20u64 {
                producer_b.publish_event(i).await;
            }
        });
        event_handler.start_handler().await;
        assert_eq!(total.load(Ordering::SeqCst), (0..20).sum::<u64>());
    }
}
