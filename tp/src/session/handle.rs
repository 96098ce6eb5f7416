//! SessionHandle - actor that serializes event delivery for one session
//!
//! Chat responses, widget callbacks and search results may arrive from
//! different tasks. All of them go through one mpsc queue and are drained one
//! at a time, so the reducer never sees interleaved events.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::orchestrator::{Dispatch, Effect, Event};
use crate::resolver::ResolverOptions;

use super::bus::{SessionBus, SessionEvent};
use super::facade::{SessionSnapshot, TripSession};
use super::search::SearchExecutor;

/// Default queue depth (events)
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session actor has shut down")]
    Closed,
}

enum SessionCommand {
    Submit {
        event: Event,
        reply: Option<oneshot::Sender<Dispatch>>,
    },
    /// Result of the search started under `generation`
    SearchOutcome {
        generation: u64,
        event: Event,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<SessionEvent>>,
    },
    Shutdown,
}

/// Cheap-to-clone handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Spawn the session actor on the current tokio runtime
    pub fn spawn(
        options: ResolverOptions,
        queue_capacity: usize,
        event_capacity: usize,
        executor: Arc<dyn SearchExecutor>,
    ) -> Self {
        let session = TripSession::with_bus(options, SessionBus::new(event_capacity));
        info!(session_id = %session.id(), "SessionHandle::spawn: starting session actor");

        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(actor_loop(session, rx, tx.downgrade(), executor));
        Self { tx }
    }

    pub fn from_config(config: &Config, executor: Arc<dyn SearchExecutor>) -> Self {
        Self::spawn(
            config.resolver.clone(),
            config.session.queue_capacity,
            config.session.event_capacity,
            executor,
        )
    }

    /// Queue an event and wait for it to be processed
    pub async fn submit(&self, event: Event) -> Result<Dispatch, SessionError> {
        debug!(event = event.name(), "SessionHandle::submit: called");
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Submit {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn subscribe(&self) -> Result<broadcast::Receiver<SessionEvent>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Subscribe { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

async fn actor_loop(
    mut session: TripSession,
    mut rx: mpsc::Receiver<SessionCommand>,
    feedback: mpsc::WeakSender<SessionCommand>,
    executor: Arc<dyn SearchExecutor>,
) {
    debug!(session_id = %session.id(), "actor_loop: started");
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Submit { event, reply } => {
                let dispatch = session.submit(event);
                for effect in &dispatch.effects {
                    run_effect(effect, &feedback, &executor);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(dispatch);
                }
            }
            SessionCommand::SearchOutcome { generation, event } => {
                let current = session.state().search_generation();
                if generation != current {
                    warn!(
                        generation,
                        current,
                        event = event.name(),
                        "actor_loop: dropping outcome of cancelled search"
                    );
                    continue;
                }
                session.submit(event);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(session.snapshot());
            }
            SessionCommand::Subscribe { reply } => {
                let _ = reply.send(session.subscribe());
            }
            SessionCommand::Shutdown => {
                debug!("actor_loop: shutdown requested");
                break;
            }
        }
    }
    info!(session_id = %session.id(), "actor_loop: session actor stopped");
}

/// Run an effect outside the reducer; its outcome re-enters through the queue
fn run_effect(effect: &Effect, feedback: &mpsc::WeakSender<SessionCommand>, executor: &Arc<dyn SearchExecutor>) {
    match effect {
        Effect::ExecuteSearch { generation, facts } => {
            let Some(tx) = feedback.upgrade() else {
                debug!("run_effect: session closing, search not started");
                return;
            };
            let executor = Arc::clone(executor);
            let generation = *generation;
            let facts = facts.clone();
            tokio::spawn(async move {
                let event = match executor.search(facts).await {
                    Ok(()) => Event::SearchSucceeded,
                    Err(e) => {
                        warn!(error = %e, "run_effect: search failed");
                        Event::SearchFailed { error: e.to_string() }
                    }
                };
                if tx.send(SessionCommand::SearchOutcome { generation, event }).await.is_err() {
                    debug!("run_effect: session gone before search finished");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{City, IntentEntities, TripFacts, TripType};
    use crate::orchestrator::StateName;
    use crate::session::search::SearchError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct FixedOutcome(Result<(), SearchError>);

    #[async_trait]
    impl SearchExecutor for FixedOutcome {
        async fn search(&self, _facts: TripFacts) -> Result<(), SearchError> {
            self.0.clone()
        }
    }

    /// First search blocks until released; later searches never finish
    #[derive(Default)]
    struct GatedExecutor {
        calls: AtomicUsize,
        release_first: Notify,
        first_done: Notify,
    }

    #[async_trait]
    impl SearchExecutor for GatedExecutor {
        async fn search(&self, _facts: TripFacts) -> Result<(), SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                self.release_first.notified().await;
                self.first_done.notify_one();
            } else {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn spawn(outcome: Result<(), SearchError>) -> SessionHandle {
        SessionHandle::spawn(ResolverOptions::default(), 16, 64, Arc::new(FixedOutcome(outcome)))
    }

    async fn make_ready(handle: &SessionHandle) {
        handle
            .submit(Event::intent(IntentEntities {
                destination: Some(City::named("Paris")),
                departure_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                return_date: NaiveDate::from_ymd_opt(2025, 6, 8),
                ..Default::default()
            }))
            .await
            .unwrap();
        handle
            .submit(Event::TravelersSelected {
                adults: 2,
                children: 0,
                infants: 0,
            })
            .await
            .unwrap();
        handle
            .submit(Event::TripTypeConfirmed {
                trip_type: TripType::Roundtrip,
            })
            .await
            .unwrap();
    }

    async fn wait_for_state(handle: &SessionHandle, state: StateName) -> SessionSnapshot {
        for _ in 0..50 {
            let snapshot = handle.snapshot().await.unwrap();
            if snapshot.current_state == state {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {}", state);
    }

    #[tokio::test]
    async fn test_submit_and_snapshot() {
        let handle = spawn(Ok(()));
        let dispatch = handle.submit(Event::user_message("hello")).await.unwrap();
        assert!(dispatch.is_applied());

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_state, StateName::WidgetActive);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn test_search_success_feeds_back() {
        let handle = spawn(Ok(()));
        make_ready(&handle).await;

        let dispatch = handle.submit(Event::SearchTriggered).await.unwrap();
        assert_eq!(dispatch.transitions, vec![StateName::Searching]);

        let snapshot = wait_for_state(&handle, StateName::Idle).await;
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_search_failure_feeds_back() {
        let handle = spawn(Err(SearchError::Timeout));
        make_ready(&handle).await;
        handle.submit(Event::SearchTriggered).await.unwrap();

        let snapshot = wait_for_state(&handle, StateName::ReadyToSearch).await;
        assert_eq!(snapshot.last_error.as_deref(), Some("timeout"));
        assert!(snapshot.is_ready_to_search);
    }

    #[tokio::test]
    async fn test_cancelled_search_cannot_complete_a_later_one() {
        let gate = Arc::new(GatedExecutor::default());
        let handle = SessionHandle::spawn(ResolverOptions::default(), 16, 64, gate.clone());

        make_ready(&handle).await;
        handle.submit(Event::SearchTriggered).await.unwrap();
        handle.submit(Event::Reset).await.unwrap();
        make_ready(&handle).await;
        handle.submit(Event::SearchTriggered).await.unwrap();

        gate.release_first.notify_one();
        gate.first_done.notified().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_state, StateName::Searching);
        assert_eq!(gate.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_submitters_are_serialized() {
        let handle = spawn(Ok(()));
        let mut tasks = Vec::new();
        for i in 0..10 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.submit(Event::user_message(format!("message {}", i))).await
            }));
        }
        let mut applied = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().is_applied() {
                applied += 1;
            }
        }

        // Only the first message finds the session Idle; the rest hit an active widget
        assert_eq!(applied, 1);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_through_handle() {
        let handle = spawn(Ok(()));
        let mut rx = handle.subscribe().await.unwrap();
        handle.submit(Event::user_message("hello")).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "WidgetShown");
    }

    #[tokio::test]
    async fn test_from_config_uses_resolver_options() {
        let mut config = Config::default();
        config.resolver.range_picker_for_roundtrip = true;
        let handle = SessionHandle::from_config(&config, Arc::new(FixedOutcome(Ok(()))));

        handle
            .submit(Event::intent(IntentEntities {
                destination: Some(City::named("Paris")),
                ..Default::default()
            }))
            .await
            .unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(
            snapshot.active_widget.map(|w| w.widget_type),
            Some(crate::domain::WidgetType::DateRangePicker)
        );
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let handle = spawn(Ok(()));
        handle.shutdown().await.unwrap();

        let mut closed = false;
        for _ in 0..50 {
            if handle.snapshot().await.is_err() {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(closed);
    }
}
