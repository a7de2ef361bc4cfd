//! Platform listeners.
//!
//! A platform client pushes its native events into an `mpsc` channel; a
//! [`Listener`] drains it, runs each event through the platform's
//! [`Normalizer`] and hands the resulting interaction to the shared
//! [`Dispatcher`]. Every event is its own task, so a slow component never
//! holds up the next event.

use std::fmt;
use std::sync::Arc;

use crossbot_core::{ReceivedInteraction, Source};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::dispatcher::{DispatchOutcome, Dispatcher};

/// Translates one platform's native events into interactions.
pub trait Normalizer: Send + Sync + 'static {
    /// The platform's native event type.
    type Event: Send + 'static;

    fn source(&self) -> Source;

    /// Returns `None` for events this engine does not handle.
    fn normalize(&self, event: Self::Event) -> Option<ReceivedInteraction>;
}

/// Feeds one platform's events to the dispatcher.
pub struct Listener<N: Normalizer> {
    normalizer: Arc<N>,
    dispatcher: Arc<Dispatcher>,
    shutdown: Mutex<CancellationToken>,
}

impl<N: Normalizer> Listener<N> {
    pub fn new(normalizer: N, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            normalizer: Arc::new(normalizer),
            dispatcher,
            shutdown: Mutex::new(CancellationToken::new()),
        }
    }

    /// Ties the receive loop to an outer token, so cancelling that token
    /// also stops this listener.
    pub fn with_shutdown(self, token: CancellationToken) -> Self {
        *self.shutdown.lock() = token;
        self
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// Normalizes and dispatches one event inline.
    ///
    /// Returns `None` when the normalizer declined the event.
    pub async fn handle(&self, event: N::Event) -> Option<DispatchOutcome> {
        process(self.normalizer.as_ref(), self.dispatcher.as_ref(), event).await
    }

    /// Spawns the receive loop. Each received event is dispatched on its own
    /// task. The loop ends when the sender side closes or on
    /// [`stop_listening`](Self::stop_listening).
    pub fn start_listening(&self, mut events: mpsc::Receiver<N::Event>) -> JoinHandle<()> {
        let token = {
            let mut shutdown = self.shutdown.lock();
            if shutdown.is_cancelled() {
                *shutdown = CancellationToken::new();
            }
            shutdown.clone()
        };
        let normalizer = Arc::clone(&self.normalizer);
        let dispatcher = Arc::clone(&self.dispatcher);
        let source = normalizer.source();

        info!(%source, "Listener started");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!(%source, "Listener cancelled");
                        break;
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            debug!(%source, "Event channel closed");
                            break;
                        };
                        let normalizer = Arc::clone(&normalizer);
                        let dispatcher = Arc::clone(&dispatcher);
                        tokio::spawn(async move {
                            process(normalizer.as_ref(), dispatcher.as_ref(), event).await;
                        });
                    }
                }
            }
            info!(%source, "Listener stopped");
        })
    }

    /// Stops the receive loop. Dispatches already in flight run to completion.
    pub fn stop_listening(&self) {
        self.shutdown.lock().cancel();
    }
}

impl<N: Normalizer> fmt::Debug for Listener<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("source", &self.normalizer.source())
            .field("stopped", &self.shutdown.lock().is_cancelled())
            .finish()
    }
}

async fn process<N: Normalizer>(
    normalizer: &N,
    dispatcher: &Dispatcher,
    event: N::Event,
) -> Option<DispatchOutcome> {
    let Some(interaction) = normalizer.normalize(event) else {
        trace!(source = %normalizer.source(), "Event not applicable, skipping");
        return None;
    };
    Some(dispatcher.dispatch(interaction).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::BoxedComponent;
    use crate::registry::ComponentRegistry;
    use crate::source::StaticSource;
    use crate::testing::{Recorded, ReplyLog, text_interaction};
    use crossbot_core::ComponentType;
    use std::time::Duration;

    /// Treats lines starting with `!` as commands.
    struct Bang;

    impl Normalizer for Bang {
        type Event = String;

        fn source(&self) -> Source {
            Source::Guilded
        }

        fn normalize(&self, line: String) -> Option<ReceivedInteraction> {
            let key = line.strip_prefix('!')?;
            Some(text_interaction(
                ComponentType::Command,
                key,
                Arc::new(ReplyLog::default()),
            ))
        }
    }

    async fn dispatcher_with(component: &Arc<Recorded>) -> Arc<Dispatcher> {
        let registry = Arc::new(ComponentRegistry::new());
        registry
            .load(vec![Arc::new(StaticSource::new(
                "test",
                vec![Arc::clone(component) as BoxedComponent],
            ))])
            .await;
        Arc::new(Dispatcher::new(registry))
    }

    #[test]
    fn test_handle_skips_unrelated_events() {
        tokio_test::block_on(async {
            let ping = Arc::new(Recorded::command("ping"));
            let listener = Listener::new(Bang, dispatcher_with(&ping).await);

            assert_eq!(listener.handle("hello".into()).await, None);
            assert_eq!(
                listener.handle("!ping".into()).await,
                Some(DispatchOutcome::Succeeded)
            );
            assert_eq!(ping.runs(), 1);
        });
    }

    #[tokio::test]
    async fn test_listener_dispatches_until_stopped() {
        let ping = Arc::new(Recorded::command("ping"));
        let listener = Listener::new(Bang, dispatcher_with(&ping).await);
        let (tx, rx) = mpsc::channel(8);

        let handle = listener.start_listening(rx);
        tx.send("!ping".to_string()).await.unwrap();
        tx.send("chatter".to_string()).await.unwrap();
        tx.send("!ping".to_string()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while ping.runs() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        listener.stop_listening();
        handle.await.unwrap();
        assert_eq!(ping.runs(), 2);
    }

    #[tokio::test]
    async fn test_listener_ends_when_channel_closes() {
        let ping = Arc::new(Recorded::command("ping"));
        let listener = Listener::new(Bang, dispatcher_with(&ping).await);
        let (tx, rx) = mpsc::channel::<String>(1);

        let handle = listener.start_listening(rx);
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_outer_token_stops_listener() {
        let ping = Arc::new(Recorded::command("ping"));
        let root = CancellationToken::new();
        let listener =
            Listener::new(Bang, dispatcher_with(&ping).await).with_shutdown(root.child_token());
        let (_tx, rx) = mpsc::channel::<String>(1);

        let handle = listener.start_listening(rx);
        root.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
