//! Live availability checks for user-typed slugs
//!
//! An [`AvailabilityChecker`] backs one input field. It never searches suffixes;
//! it answers whether the exact slug typed is well-formed and free, and
//! publishes the answer as an [`AvailabilityState`].
//!
//! Checks may overlap when input changes faster than the oracle answers. Every
//! check takes a generation ticket when it starts and its result is published
//! only if no newer check has started since, so a slow answer for stale input
//! can never overwrite the state of newer input.

use crate::config::SlugConfig;
use crate::database::traits::UniquenessOracle;
use crate::resolver::{query_oracle, SlugResolver};
use crate::schema::AvailabilityState;
use crate::slug::is_valid;
use crate::INVALID_FORMAT_MESSAGE;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// How far starting a check got
enum Started {
    /// Nothing left to query; carries the published state, if any
    Settled(Option<AvailabilityState>),

    /// Pending state published; the oracle query for this ticket is due
    Querying(u64),
}

/// Availability checker for one input field
///
/// State is held per instance; checkers built on the same oracle do not see
/// each other's checks.
pub struct AvailabilityChecker<O: UniquenessOracle> {
    oracle: Arc<O>,
    namespace: String,
    config: SlugConfig,
    generation: AtomicU64,
    state: watch::Sender<AvailabilityState>,
}

impl<O: UniquenessOracle> AvailabilityChecker<O> {
    /// Create a checker for slugs in `namespace`
    pub fn new(oracle: Arc<O>, namespace: impl Into<String>, config: SlugConfig) -> Self {
        let (state, _) = watch::channel(AvailabilityState::default());
        Self {
            oracle,
            namespace: namespace.into(),
            config,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Create a checker sharing a resolver's oracle and settings
    pub fn for_resolver(resolver: &SlugResolver<O>, namespace: impl Into<String>) -> Self {
        Self::new(
            Arc::clone(resolver.oracle()),
            namespace,
            resolver.config().clone(),
        )
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AvailabilityState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published state change
    pub fn subscribe(&self) -> watch::Receiver<AvailabilityState> {
        self.state.subscribe()
    }

    /// Publish `next` unless a check newer than `ticket` has started
    fn publish(&self, ticket: u64, next: AvailabilityState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Check one candidate and publish the verdict
    ///
    /// Malformed candidates are reported as unavailable with
    /// `"Invalid slug format"` and cost no oracle query. Oracle failures leave
    /// `available` unknown and carry the error message.
    ///
    /// # Returns
    ///
    /// The published state, or `None` if a newer check started before this one
    /// finished and its result was discarded
    pub async fn check(&self, candidate: &str) -> Option<AvailabilityState> {
        match self.start(candidate) {
            Started::Settled(state) => state,
            Started::Querying(ticket) => self.finish(ticket, candidate).await,
        }
    }

    /// Take a ticket and publish the immediate state for `candidate`
    ///
    /// Runs without suspending, so the ticket order is the call order and the
    /// published state is visible as soon as this returns.
    fn start(&self, candidate: &str) -> Started {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !is_valid(candidate) {
            let rejected = AvailabilityState {
                candidate: Some(candidate.to_string()),
                checking: false,
                available: Some(false),
                error: Some(INVALID_FORMAT_MESSAGE.to_string()),
            };
            return Started::Settled(self.publish(ticket, rejected.clone()).then_some(rejected));
        }

        let pending = AvailabilityState {
            candidate: Some(candidate.to_string()),
            checking: true,
            available: None,
            error: None,
        };
        if self.publish(ticket, pending) {
            Started::Querying(ticket)
        } else {
            Started::Settled(None)
        }
    }

    /// Query the oracle for a started check and publish the verdict
    async fn finish(&self, ticket: u64, candidate: &str) -> Option<AvailabilityState> {
        let outcome = query_oracle(
            self.oracle.as_ref(),
            self.config.oracle_timeout(),
            &self.namespace,
            candidate,
        )
        .await;

        let settled = match outcome {
            Ok(taken) => AvailabilityState {
                candidate: Some(candidate.to_string()),
                checking: false,
                available: Some(!taken),
                error: None,
            },
            Err(error) => AvailabilityState {
                candidate: Some(candidate.to_string()),
                checking: false,
                available: None,
                error: Some(error.to_string()),
            },
        };

        self.publish(ticket, settled.clone()).then_some(settled)
    }

    /// Whether `candidate` already has a check running or a definite answer
    fn is_current(&self, candidate: &str) -> bool {
        let state = self.state.borrow();
        state.candidate.as_deref() == Some(candidate) && (state.checking || state.error.is_none())
    }

    /// Check input values as they settle
    ///
    /// Waits until `input` has not changed for the configured debounce period,
    /// then starts a check for the settled value without waiting for the
    /// previous one. A settled value that is already checked (or being
    /// checked) is skipped. Returns once the input sender is dropped and every
    /// started check has finished.
    pub async fn watch_input(self: Arc<Self>, mut input: watch::Receiver<String>) {
        let debounce = self.config.debounce();
        let mut checks = JoinSet::new();
        let mut open = true;

        while open {
            if input.changed().await.is_err() {
                break;
            }

            // Restart the quiet period on every change
            loop {
                match tokio::time::timeout(debounce, input.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => {
                        open = false;
                        break;
                    }
                    Err(_) => break,
                }
            }

            let candidate = input.borrow_and_update().clone();
            if self.is_current(&candidate) {
                continue;
            }

            // Ticket and pending state are taken here, before the query task runs
            if let Started::Querying(ticket) = self.start(&candidate) {
                let checker = Arc::clone(&self);
                checks.spawn(async move {
                    checker.finish(ticket, &candidate).await;
                });
            }

            while checks.try_join_next().is_some() {}
        }

        while checks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryOracle;
    use crate::database::traits::OracleError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Holds every query until the test answers it
    #[derive(Default)]
    struct GatedOracle {
        waiting: Mutex<HashMap<String, oneshot::Sender<bool>>>,
        queries: std::sync::atomic::AtomicUsize,
    }

    impl GatedOracle {
        fn is_waiting(&self, candidate: &str) -> bool {
            self.waiting.lock().unwrap().contains_key(candidate)
        }

        fn answer(&self, candidate: &str, taken: bool) {
            let sender = self.waiting.lock().unwrap().remove(candidate).unwrap();
            sender.send(taken).unwrap();
        }
    }

    #[async_trait]
    impl UniquenessOracle for GatedOracle {
        async fn exists(&self, _namespace: &str, candidate: &str) -> Result<bool, OracleError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let (sender, receiver) = oneshot::channel();
            self.waiting
                .lock()
                .unwrap()
                .insert(candidate.to_string(), sender);
            receiver
                .await
                .map_err(|error| OracleError::Query(error.to_string()))
        }
    }

    /// Fails every query
    struct Broken;

    #[async_trait]
    impl UniquenessOracle for Broken {
        async fn exists(&self, _namespace: &str, _candidate: &str) -> Result<bool, OracleError> {
            Err(OracleError::Connection("connection refused".to_string()))
        }
    }

    fn config() -> SlugConfig {
        SlugConfig::default().with_debounce(Duration::from_millis(20))
    }

    async fn wait_until_waiting(oracle: &GatedOracle, candidate: &str) {
        while !oracle.is_waiting(candidate) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_available_and_taken() {
        let oracle = Arc::new(MemoryOracle::with_taken("alice", ["card"]));
        let checker = AvailabilityChecker::new(oracle.clone(), "alice", config());

        let state = checker.check("card").await.unwrap();
        assert_eq!(state.available, Some(false));
        assert_eq!(state.error, None);
        assert!(!state.checking);

        checker.check("card-grid").await.unwrap();
        assert_eq!(
            checker.state(),
            AvailabilityState {
                candidate: Some("card-grid".to_string()),
                checking: false,
                available: Some(true),
                error: None,
            }
        );
        assert_eq!(oracle.query_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_format_skips_oracle() {
        let oracle = Arc::new(MemoryOracle::new());
        let checker = AvailabilityChecker::new(oracle.clone(), "alice", config());

        let state = checker.check("Invalid Slug!").await.unwrap();
        assert_eq!(state.available, Some(false));
        assert_eq!(state.error.as_deref(), Some("Invalid slug format"));
        assert!(!state.checking);
        assert_eq!(oracle.query_count(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_leaves_availability_unknown() {
        let checker = AvailabilityChecker::new(Arc::new(Broken), "alice", config());

        let state = checker.check("card").await.unwrap();
        assert_eq!(state.available, None);
        assert!(!state.checking);
        assert!(state.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_last_request_wins_when_answers_arrive_reversed() {
        let oracle = Arc::new(GatedOracle::default());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));

        let mut handles = Vec::new();
        for candidate in ["b", "bu", "button"] {
            let task_checker = Arc::clone(&checker);
            handles.push(tokio::spawn(async move { task_checker.check(candidate).await }));
            wait_until_waiting(&oracle, candidate).await;
        }

        oracle.answer("button", false);
        oracle.answer("bu", true);
        oracle.answer("b", true);

        let results: Vec<_> = futures_results(handles).await;
        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert!(results[2].is_some());

        let state = checker.state();
        assert_eq!(state.candidate.as_deref(), Some("button"));
        assert_eq!(state.available, Some(true));
        assert!(!state.checking);
    }

    #[tokio::test]
    async fn test_stale_answer_does_not_touch_pending_state() {
        let oracle = Arc::new(GatedOracle::default());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));

        let first_checker = Arc::clone(&checker);
        let first = tokio::spawn(async move { first_checker.check("card").await });
        wait_until_waiting(&oracle, "card").await;

        let second_checker = Arc::clone(&checker);
        let second = tokio::spawn(async move { second_checker.check("card-grid").await });
        wait_until_waiting(&oracle, "card-grid").await;

        oracle.answer("card", false);
        assert_eq!(first.await.unwrap(), None);

        let state = checker.state();
        assert_eq!(state.candidate.as_deref(), Some("card-grid"));
        assert!(state.checking);
        assert_eq!(state.available, None);

        oracle.answer("card-grid", true);
        let settled = second.await.unwrap().unwrap();
        assert_eq!(settled.available, Some(false));
        assert_eq!(checker.state(), settled);
    }

    #[tokio::test]
    async fn test_invalid_input_supersedes_pending_check() {
        let oracle = Arc::new(GatedOracle::default());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));

        let pending_checker = Arc::clone(&checker);
        let pending = tokio::spawn(async move { pending_checker.check("card").await });
        wait_until_waiting(&oracle, "card").await;

        checker.check("Card!").await.unwrap();
        oracle.answer("card", false);
        assert_eq!(pending.await.unwrap(), None);

        let state = checker.state();
        assert_eq!(state.candidate.as_deref(), Some("Card!"));
        assert_eq!(state.available, Some(false));
        assert_eq!(state.error.as_deref(), Some("Invalid slug format"));
    }

    #[tokio::test]
    async fn test_start_publishes_before_query_runs() {
        let oracle = Arc::new(GatedOracle::default());
        let checker = AvailabilityChecker::new(oracle.clone(), "alice", config());

        let first = checker.start("card");
        let second = checker.start("card-grid");
        assert!(matches!(first, Started::Querying(1)));
        assert!(matches!(second, Started::Querying(2)));

        let state = checker.state();
        assert_eq!(state.candidate.as_deref(), Some("card-grid"));
        assert!(state.checking);
        assert_eq!(oracle.queries.load(Ordering::SeqCst), 0);

        let finishing = checker.finish(1, "card");
        tokio::pin!(finishing);
        tokio::select! {
            _ = &mut finishing => panic!("answered before the oracle replied"),
            _ = wait_until_waiting(&oracle, "card") => {}
        }
        oracle.answer("card", false);
        assert_eq!(finishing.await, None);
        assert_eq!(checker.state().candidate.as_deref(), Some("card-grid"));
    }

    #[tokio::test]
    async fn test_watch_input_does_not_repeat_pending_query() {
        let oracle = Arc::new(GatedOracle::default());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));
        let (input, receiver) = watch::channel(String::new());
        let watcher = tokio::spawn(Arc::clone(&checker).watch_input(receiver));

        input.send_replace("card".to_string());
        wait_until_waiting(&oracle, "card").await;
        input.send_replace("card".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;

        oracle.answer("card", true);
        drop(input);
        watcher.await.unwrap();

        assert_eq!(oracle.queries.load(Ordering::SeqCst), 1);
        assert_eq!(checker.state().available, Some(false));
    }

    #[tokio::test]
    async fn test_instances_do_not_share_state() {
        let oracle = Arc::new(MemoryOracle::with_taken("alice", ["card"]));
        let first = AvailabilityChecker::new(oracle.clone(), "alice", config());
        let second = AvailabilityChecker::new(oracle.clone(), "alice", config());

        first.check("card").await.unwrap();
        assert_eq!(first.state().available, Some(false));
        assert_eq!(second.state(), AvailabilityState::default());
    }

    #[tokio::test]
    async fn test_for_resolver_shares_oracle_and_settings() {
        let resolver = SlugResolver::with_config(
            MemoryOracle::with_taken("alice", ["card"]),
            config().with_max_attempts(5),
        );
        let checker = AvailabilityChecker::for_resolver(&resolver, "alice");

        assert_eq!(checker.namespace(), "alice");
        assert_eq!(checker.check("card").await.unwrap().available, Some(false));
        assert_eq!(resolver.oracle().query_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_published_state() {
        let oracle = Arc::new(MemoryOracle::new());
        let checker = AvailabilityChecker::new(oracle, "alice", config());
        let mut receiver = checker.subscribe();

        checker.check("card").await.unwrap();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().available, Some(true));
    }

    #[tokio::test]
    async fn test_watch_input_checks_only_settled_value() {
        let oracle = Arc::new(MemoryOracle::new());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));
        let (input, receiver) = watch::channel(String::new());
        let watcher = tokio::spawn(Arc::clone(&checker).watch_input(receiver));

        for typed in ["m", "my", "my-b", "my-button"] {
            input.send_replace(typed.to_string());
        }
        drop(input);
        watcher.await.unwrap();

        assert_eq!(oracle.queried_candidates(), vec!["my-button"]);
        assert_eq!(checker.state().candidate.as_deref(), Some("my-button"));
    }

    #[tokio::test]
    async fn test_watch_input_skips_repeated_value() {
        let oracle = Arc::new(MemoryOracle::new());
        let checker = Arc::new(AvailabilityChecker::new(oracle.clone(), "alice", config()));
        let (input, receiver) = watch::channel(String::new());
        let watcher = tokio::spawn(Arc::clone(&checker).watch_input(receiver));

        input.send_replace("card".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        input.send_replace("card".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        input.send_replace("card-grid".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(input);
        watcher.await.unwrap();

        assert_eq!(oracle.queried_candidates(), vec!["card", "card-grid"]);
        assert_eq!(checker.state().available, Some(true));
    }

    async fn futures_results(
        handles: Vec<tokio::task::JoinHandle<Option<AvailabilityState>>>,
    ) -> Vec<Option<AvailabilityState>> {
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }
}
