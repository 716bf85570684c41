//! Acquisition session: controller task and sampling actor.
//!
//! ```text
//!                    SessionEvent (mpsc)
//!  sampling actor ──────────────────────┐
//!   every poll_interval:                 ▼
//!   spawn_blocking(last_known_fix)   controller ──► SessionUpdate (mpsc) ──► caller
//!                                        ▲  │
//!        ticker / deadline / cancel ─────┘  └──► AcquisitionState (watch)
//! ```
//!
//! The controller owns the best fix. Every input (sample, tick, timeout,
//! cancel) is folded into a [`SessionEvent`] and applied by one transition
//! function, so updates reach the caller in a single order. Cancellation is
//! cooperative: a provider query already running is allowed to finish, but
//! its result is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::model::BestFix;
use super::provider::{Authorization, LocationBackend, LocationProvider};
use super::state::{
    AcquisitionFailure, AcquisitionOutcome, AcquisitionState, FixQuality, LocationFix, SurveyFix,
};
use crate::geodesy::GeodeticTransform;

/// Default overall session timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);
/// Default interval between provider polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default elapsed-time ticker period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Default per-query limit for a single provider call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
/// Default minimum accuracy improvement, meters.
pub const DEFAULT_HYSTERESIS_M: f64 = 2.0;
/// Default accuracy at which the best fix ends the session, meters.
pub const DEFAULT_GOOD_ENOUGH_M: f64 = 20.0;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub query_timeout: Duration,
    pub hysteresis_margin: f64,
    pub good_enough: f64,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            hysteresis_margin: DEFAULT_HYSTERESIS_M,
            good_enough: DEFAULT_GOOD_ENOUGH_M,
        }
    }
}

/// Notifications delivered to the caller, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The session entered a new state
    StateChanged(AcquisitionState),
    /// Periodic elapsed-time report
    Elapsed {
        elapsed: Duration,
        best_accuracy: Option<f64>,
    },
    /// A reading became the new best fix
    BestFixImproved(LocationFix),
    /// Terminal outcome; always the last update
    Finished(AcquisitionOutcome),
}

/// Per-round sampling problem. Logged; the next poll retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("provider '{provider}' did not answer within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
    #[error("provider '{provider}' query failed: {message}")]
    Join { provider: String, message: String },
}

/// Input to the controller's transition function.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SampleArrived(LocationFix),
    SamplingFailed(SamplingError),
    Tick(Duration),
    Timeout,
    Cancel,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Continue(Vec<SessionUpdate>),
    Finish(Vec<SessionUpdate>, AcquisitionOutcome),
}

/// Polling-phase state machine. Takes no clock readings and does no I/O;
/// time arrives as events.
#[derive(Debug, Clone)]
pub struct Acquisition {
    best: BestFix,
    good_enough: f64,
    transform: GeodeticTransform,
}

impl Acquisition {
    pub fn new(settings: &AcquisitionSettings, transform: GeodeticTransform) -> Self {
        Self {
            best: BestFix::new(settings.hysteresis_margin),
            good_enough: settings.good_enough,
            transform,
        }
    }

    /// Apply the last-known readings collected at start.
    pub fn seed(&mut self, seeds: Vec<LocationFix>) -> Vec<SessionUpdate> {
        for fix in seeds {
            self.best.seed(fix);
        }
        self.best
            .get()
            .map(|fix| vec![SessionUpdate::BestFixImproved(fix.clone())])
            .unwrap_or_default()
    }

    pub fn best(&self) -> Option<&LocationFix> {
        self.best.get()
    }

    pub fn handle(&mut self, event: SessionEvent) -> Transition {
        match event {
            SessionEvent::SampleArrived(fix) => {
                let mut updates = Vec::new();
                if self.best.offer(fix) {
                    if let Some(best) = self.best.get() {
                        updates.push(SessionUpdate::BestFixImproved(best.clone()));
                    }
                }
                // Checked on every sample: a rejected repeat of an accurate
                // seed still completes the session.
                if self.best.is_within(self.good_enough) {
                    let outcome = self.complete(FixQuality::Live);
                    return Transition::Finish(updates, outcome);
                }
                Transition::Continue(updates)
            }
            SessionEvent::SamplingFailed(error) => {
                warn!(error = %error, "Location sampling round failed");
                Transition::Continue(Vec::new())
            }
            SessionEvent::Tick(elapsed) => Transition::Continue(vec![SessionUpdate::Elapsed {
                elapsed,
                best_accuracy: self.best.get().map(|f| f.accuracy),
            }]),
            SessionEvent::Timeout => {
                let updates = vec![SessionUpdate::StateChanged(AcquisitionState::TimedOut)];
                let outcome = match self.best.get() {
                    Some(_) => self.complete(FixQuality::BestAvailable),
                    None => AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained),
                };
                Transition::Finish(updates, outcome)
            }
            SessionEvent::Cancel => Transition::Finish(Vec::new(), AcquisitionOutcome::Cancelled),
        }
    }

    fn complete(&self, quality: FixQuality) -> AcquisitionOutcome {
        let Some(fix) = self.best.get() else {
            return AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained);
        };
        match self.transform.inverse(fix.geographic()) {
            Ok(grid) => AcquisitionOutcome::Done(SurveyFix {
                fix: fix.clone(),
                grid,
                quality,
            }),
            Err(e) => AcquisitionOutcome::Failed(AcquisitionFailure::Transform(e)),
        }
    }
}

/// One acquisition attempt. Consumed by [`start`](Self::start).
pub struct LocationSession {
    backend: Arc<dyn LocationBackend>,
    settings: AcquisitionSettings,
    transform: GeodeticTransform,
}

impl LocationSession {
    pub fn new(backend: Arc<dyn LocationBackend>, settings: AcquisitionSettings) -> Self {
        Self {
            backend,
            settings,
            transform: GeodeticTransform::sld99(),
        }
    }

    pub fn with_transform(mut self, transform: GeodeticTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Spawn the controller. Must be called within a tokio runtime.
    pub fn start(self) -> SessionHandle {
        let cancel = CancellationToken::new();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AcquisitionState::Idle);

        let controller = Controller {
            updates: updates_tx,
            state: state_tx,
        };
        let task = tokio::spawn(controller.run(self, cancel.clone()));

        SessionHandle {
            cancel,
            updates: updates_rx,
            state: state_rx,
            task,
        }
    }
}

/// Caller's side of a running session.
pub struct SessionHandle {
    cancel: CancellationToken,
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    state: watch::Receiver<AcquisitionState>,
    task: JoinHandle<AcquisitionOutcome>,
}

impl SessionHandle {
    /// Cancel the session. Idempotent; has no effect once it has finished.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Current state.
    pub fn state(&self) -> AcquisitionState {
        *self.state.borrow()
    }

    /// Next update, or `None` once the session has finished and all updates
    /// have been received.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.updates.recv().await
    }

    /// Wait for the terminal outcome.
    pub async fn outcome(self) -> AcquisitionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => AcquisitionOutcome::Failed(AcquisitionFailure::Interrupted(e.to_string())),
        }
    }
}

struct Controller {
    updates: mpsc::UnboundedSender<SessionUpdate>,
    state: watch::Sender<AcquisitionState>,
}

impl Controller {
    fn emit(&self, update: SessionUpdate) {
        if let SessionUpdate::StateChanged(state) = &update {
            self.state.send_replace(*state);
        }
        // Caller may have dropped the handle; the session still runs to completion
        let _ = self.updates.send(update);
    }

    fn finish(&self, outcome: AcquisitionOutcome) -> AcquisitionOutcome {
        match &outcome {
            AcquisitionOutcome::Done(fix) => info!(
                accuracy = fix.fix.accuracy,
                quality = %fix.quality,
                "Location acquired"
            ),
            AcquisitionOutcome::Failed(e) => info!(error = %e, "Location acquisition failed"),
            AcquisitionOutcome::Cancelled => info!("Location acquisition cancelled"),
        }
        self.emit(SessionUpdate::StateChanged(outcome.state()));
        self.emit(SessionUpdate::Finished(outcome.clone()));
        outcome
    }

    async fn run(self, session: LocationSession, cancel: CancellationToken) -> AcquisitionOutcome {
        let LocationSession {
            backend,
            settings,
            transform,
        } = session;

        self.emit(SessionUpdate::StateChanged(AcquisitionState::Requesting));

        let preparing = tokio::task::spawn_blocking(move || prepare(backend.as_ref()));
        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.finish(AcquisitionOutcome::Cancelled),
            joined = preparing => joined,
        };
        let (pollable, seeds) = match prepared {
            Ok(Ok(prepared)) => prepared,
            Ok(Err(failure)) => return self.finish(AcquisitionOutcome::Failed(failure)),
            Err(e) => {
                return self.finish(AcquisitionOutcome::Failed(
                    AcquisitionFailure::Interrupted(e.to_string()),
                ))
            }
        };

        let mut acquisition = Acquisition::new(&settings, transform);
        self.emit(SessionUpdate::StateChanged(AcquisitionState::Polling));
        for update in acquisition.seed(seeds) {
            self.emit(update);
        }

        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let sampler_cancel = cancel.child_token();
        let sampler = tokio::spawn(sampling_actor(
            pollable,
            settings.poll_interval,
            settings.query_timeout,
            events_tx,
            sampler_cancel.clone(),
        ));

        let started = Instant::now();
        let deadline = tokio::time::sleep(settings.timeout);
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval_at(started + settings.tick_interval, settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let outcome = loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => SessionEvent::Cancel,
                _ = &mut deadline => SessionEvent::Timeout,
                Some(event) = events_rx.recv() => event,
                _ = ticker.tick() => SessionEvent::Tick(started.elapsed()),
            };

            match acquisition.handle(event) {
                Transition::Continue(updates) => updates.into_iter().for_each(|u| self.emit(u)),
                Transition::Finish(updates, outcome) => {
                    updates.into_iter().for_each(|u| self.emit(u));
                    break outcome;
                }
            }
        };

        // Stop sampling and drop whatever is still in flight
        sampler_cancel.cancel();
        drop(events_rx);
        drop(sampler);

        self.finish(outcome)
    }
}

/// Requesting phase: permission, provider availability, last-known seeds.
fn prepare(
    backend: &dyn LocationBackend,
) -> Result<(Vec<Arc<dyn LocationProvider>>, Vec<LocationFix>), AcquisitionFailure> {
    if backend.authorization() == Authorization::Denied {
        return Err(AcquisitionFailure::PermissionDenied);
    }

    let enabled: Vec<Arc<dyn LocationProvider>> = backend
        .providers()
        .into_iter()
        .filter(|p| p.is_enabled())
        .collect();
    let pollable: Vec<_> = enabled
        .iter()
        .filter(|p| p.kind().is_pollable())
        .cloned()
        .collect();
    if pollable.is_empty() {
        return Err(AcquisitionFailure::ProviderUnavailable);
    }

    let seeds: Vec<LocationFix> = enabled.iter().filter_map(|p| p.last_known_fix()).collect();
    debug!(
        providers = pollable.len(),
        seeds = seeds.len(),
        "Location providers ready"
    );
    Ok((pollable, seeds))
}

/// Query every pollable provider once per interval until cancelled or the
/// controller goes away.
async fn sampling_actor(
    providers: Vec<Arc<dyn LocationProvider>>,
    interval: Duration,
    query_timeout: Duration,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut outstanding: Vec<Option<JoinHandle<Option<LocationFix>>>> =
        providers.iter().map(|_| None).collect();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        for (provider, pending) in providers.iter().zip(outstanding.iter_mut()) {
            if !provider.is_enabled() {
                continue;
            }
            let name = provider.name().to_string();
            if let Some(previous) = pending.as_ref() {
                if !previous.is_finished() {
                    debug!(provider = %name, "Previous query still running, skipping provider");
                    continue;
                }
            }
            *pending = None;

            let mut query = {
                let provider = Arc::clone(provider);
                tokio::task::spawn_blocking(move || provider.last_known_fix())
            };

            let result = tokio::time::timeout(query_timeout, &mut query).await;
            let event = match result {
                Ok(Ok(Some(fix))) => SessionEvent::SampleArrived(fix),
                Ok(Ok(None)) => continue,
                Ok(Err(e)) => SessionEvent::SamplingFailed(SamplingError::Join {
                    provider: name,
                    message: e.to_string(),
                }),
                Err(_) => {
                    // The blocking call cannot be interrupted; hold on to it
                    // so the provider is not queried again until it returns.
                    *pending = Some(query);
                    SessionEvent::SamplingFailed(SamplingError::Timeout {
                        provider: name,
                        timeout: query_timeout,
                    })
                }
            };

            if events.send(event).await.is_err() {
                debug!("Controller finished, discarding sample");
                return;
            }
        }
    }
    debug!("Sampling actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::provider::{ProviderKind, StaticBackend};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider returning a fixed script of accuracies, one per call.
    struct ScriptedProvider {
        kind: ProviderKind,
        script: Mutex<VecDeque<Option<f64>>>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn new(kind: ProviderKind, script: &[Option<f64>]) -> Arc<dyn LocationProvider> {
            Self::with_delay(kind, script, Duration::ZERO)
        }

        fn with_delay(
            kind: ProviderKind,
            script: &[Option<f64>],
            delay: Duration,
        ) -> Arc<dyn LocationProvider> {
            Arc::new(Self {
                kind,
                script: Mutex::new(script.iter().copied().collect()),
                delay,
            })
        }
    }

    impl LocationProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn is_enabled(&self) -> bool {
            true
        }

        fn last_known_fix(&self) -> Option<LocationFix> {
            let next = self.script.lock().unwrap().pop_front().flatten();
            if next.is_some() && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            next.map(|accuracy| LocationFix::new(6.9271, 79.8612, accuracy, "scripted"))
        }
    }

    fn fast_settings() -> AcquisitionSettings {
        AcquisitionSettings {
            timeout: Duration::from_millis(400),
            poll_interval: Duration::from_millis(20),
            tick_interval: Duration::from_millis(50),
            query_timeout: Duration::from_secs(2),
            ..AcquisitionSettings::default()
        }
    }

    fn backend(providers: Vec<Arc<dyn LocationProvider>>) -> Arc<dyn LocationBackend> {
        Arc::new(StaticBackend::new(providers))
    }

    async fn drain(handle: &mut SessionHandle) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = handle.next_update().await {
            updates.push(update);
        }
        updates
    }

    fn sample(accuracy: f64) -> SessionEvent {
        SessionEvent::SampleArrived(LocationFix::new(6.9271, 79.8612, accuracy, "gps"))
    }

    #[test]
    fn test_transition_hysteresis_to_live() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());

        let accepted = |t: &Transition| match t {
            Transition::Continue(updates) | Transition::Finish(updates, _) => updates
                .iter()
                .any(|u| matches!(u, SessionUpdate::BestFixImproved(_))),
        };

        let t = acq.handle(sample(50.0));
        assert!(accepted(&t) && matches!(t, Transition::Continue(_)));
        let t = acq.handle(sample(45.0));
        assert!(accepted(&t));
        let t = acq.handle(sample(44.0));
        assert!(!accepted(&t));
        assert_eq!(acq.best().unwrap().accuracy, 45.0);

        match acq.handle(sample(20.0)) {
            Transition::Finish(_, AcquisitionOutcome::Done(fix)) => {
                assert_eq!(fix.quality, FixQuality::Live);
                assert_eq!(fix.fix.accuracy, 20.0);
                assert!((fix.grid.easting - 399_158.594).abs() < 0.01);
            }
            other => panic!("expected Done(Live), got {:?}", other),
        }
    }

    #[test]
    fn test_transition_accurate_seed_goes_live_on_repeat() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        acq.seed(vec![LocationFix::new(6.9271, 79.8612, 5.0, "gps")]);

        // The poll returns the cached reading again; hysteresis rejects it.
        match acq.handle(sample(5.0)) {
            Transition::Finish(updates, AcquisitionOutcome::Done(fix)) => {
                assert!(!updates
                    .iter()
                    .any(|u| matches!(u, SessionUpdate::BestFixImproved(_))));
                assert_eq!(fix.quality, FixQuality::Live);
                assert_eq!(fix.fix.accuracy, 5.0);
            }
            other => panic!("expected Done(Live), got {:?}", other),
        }
    }

    #[test]
    fn test_transition_rough_seed_needs_better_sample() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        acq.seed(vec![LocationFix::new(6.9271, 79.8612, 60.0, "network")]);
        assert!(matches!(acq.handle(sample(59.0)), Transition::Continue(_)));
    }

    #[test]
    fn test_transition_timeout_with_seed() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        let updates = acq.seed(vec![
            LocationFix::new(6.93, 79.86, 900.0, "passive"),
            LocationFix::new(6.93, 79.86, 600.0, "network"),
        ]);
        assert_eq!(updates.len(), 1);

        match acq.handle(SessionEvent::Timeout) {
            Transition::Finish(updates, AcquisitionOutcome::Done(fix)) => {
                assert_eq!(updates, vec![SessionUpdate::StateChanged(AcquisitionState::TimedOut)]);
                assert_eq!(fix.quality, FixQuality::BestAvailable);
                assert_eq!(fix.fix.accuracy, 600.0);
            }
            other => panic!("expected Done(BestAvailable), got {:?}", other),
        }
    }

    #[test]
    fn test_transition_timeout_without_fix() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        assert!(matches!(
            acq.handle(SessionEvent::Timeout),
            Transition::Finish(_, AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained))
        ));
    }

    #[test]
    fn test_transition_out_of_domain_fix() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        let far = SessionEvent::SampleArrived(LocationFix::new(51.5, -0.12, 5.0, "gps"));
        assert!(matches!(
            acq.handle(far),
            Transition::Finish(_, AcquisitionOutcome::Failed(AcquisitionFailure::Transform(_)))
        ));
    }

    #[test]
    fn test_transition_tick_reports_elapsed() {
        let mut acq = Acquisition::new(&AcquisitionSettings::default(), GeodeticTransform::sld99());
        acq.handle(sample(80.0));
        assert_eq!(
            acq.handle(SessionEvent::Tick(Duration::from_secs(3))),
            Transition::Continue(vec![SessionUpdate::Elapsed {
                elapsed: Duration::from_secs(3),
                best_accuracy: Some(80.0),
            }])
        );
    }

    #[tokio::test]
    async fn test_session_finishes_live_after_hysteresis() {
        // First call is the start-up read; polls then return 50, 45, 44, 20
        let gps = ScriptedProvider::new(
            ProviderKind::Gps,
            &[None, Some(50.0), Some(45.0), Some(44.0), Some(20.0)],
        );
        let mut handle = LocationSession::new(backend(vec![gps]), fast_settings()).start();

        let updates = drain(&mut handle).await;
        let outcome = handle.outcome().await;

        let improvements: Vec<f64> = updates
            .iter()
            .filter_map(|u| match u {
                SessionUpdate::BestFixImproved(f) => Some(f.accuracy),
                _ => None,
            })
            .collect();
        assert_eq!(improvements, vec![50.0, 45.0, 20.0]);
        match outcome {
            AcquisitionOutcome::Done(fix) => assert_eq!(fix.quality, FixQuality::Live),
            other => panic!("expected Done(Live), got {:?}", other),
        }
        assert!(matches!(updates.last(), Some(SessionUpdate::Finished(_))));
    }

    #[tokio::test]
    async fn test_session_accurate_seed_finishes_live_at_first_poll() {
        let gps = ScriptedProvider::new(ProviderKind::Gps, &[Some(5.0); 6]);
        let settings = AcquisitionSettings {
            timeout: Duration::from_secs(5),
            ..fast_settings()
        };
        let started = std::time::Instant::now();
        let mut handle = LocationSession::new(backend(vec![gps]), settings).start();

        let updates = drain(&mut handle).await;
        let improvements = updates
            .iter()
            .filter(|u| matches!(u, SessionUpdate::BestFixImproved(_)))
            .count();
        assert_eq!(improvements, 1);
        assert!(!updates.contains(&SessionUpdate::StateChanged(AcquisitionState::TimedOut)));

        match handle.outcome().await {
            AcquisitionOutcome::Done(fix) => {
                assert_eq!(fix.quality, FixQuality::Live);
                assert_eq!(fix.fix.accuracy, 5.0);
            }
            other => panic!("expected Done(Live), got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_session_timeout_with_rough_fix() {
        let passive = ScriptedProvider::new(ProviderKind::Passive, &[Some(750.0)]);
        let gps = ScriptedProvider::new(ProviderKind::Gps, &[]);
        let mut handle =
            LocationSession::new(backend(vec![passive, gps]), fast_settings()).start();

        let updates = drain(&mut handle).await;
        assert!(updates.contains(&SessionUpdate::StateChanged(AcquisitionState::TimedOut)));
        assert!(updates
            .iter()
            .any(|u| matches!(u, SessionUpdate::Elapsed { best_accuracy: Some(a), .. } if *a == 750.0)));

        match handle.outcome().await {
            AcquisitionOutcome::Done(fix) => {
                assert_eq!(fix.quality, FixQuality::BestAvailable);
                assert_eq!(fix.fix.accuracy, 750.0);
            }
            other => panic!("expected Done(BestAvailable), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_timeout_without_fix() {
        let gps = ScriptedProvider::new(ProviderKind::Gps, &[]);
        let handle = LocationSession::new(backend(vec![gps]), fast_settings()).start();

        assert_eq!(
            handle.outcome().await,
            AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained)
        );
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let gps = ScriptedProvider::new(ProviderKind::Gps, &[Some(5.0)]);
        let backend = StaticBackend::new(vec![gps])
            .with_authorization(Authorization::Denied);
        let mut handle = LocationSession::new(Arc::new(backend), fast_settings()).start();

        let updates = drain(&mut handle).await;
        assert_eq!(
            updates,
            vec![
                SessionUpdate::StateChanged(AcquisitionState::Requesting),
                SessionUpdate::StateChanged(AcquisitionState::Failed),
                SessionUpdate::Finished(AcquisitionOutcome::Failed(
                    AcquisitionFailure::PermissionDenied
                )),
            ]
        );
        assert_eq!(handle.state(), AcquisitionState::Failed);
    }

    #[tokio::test]
    async fn test_only_passive_provider_is_unavailable() {
        let passive = ScriptedProvider::new(ProviderKind::Passive, &[Some(100.0)]);
        let handle = LocationSession::new(backend(vec![passive]), fast_settings()).start();
        assert_eq!(
            handle.outcome().await,
            AcquisitionOutcome::Failed(AcquisitionFailure::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_cancel_mid_poll_discards_sample() {
        // Start-up read returns nothing; the first poll blocks for 300ms and
        // would deliver a fix good enough to finish the session.
        let gps = ScriptedProvider::with_delay(
            ProviderKind::Gps,
            &[None, Some(3.0)],
            Duration::from_millis(300),
        );
        let settings = AcquisitionSettings {
            timeout: Duration::from_secs(5),
            ..fast_settings()
        };
        let mut handle = LocationSession::new(backend(vec![gps]), settings).start();

        // Let the first poll start, then cancel while it is blocked
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();

        let updates = drain(&mut handle).await;
        assert!(!updates
            .iter()
            .any(|u| matches!(u, SessionUpdate::BestFixImproved(_))));
        assert_eq!(
            updates.last(),
            Some(&SessionUpdate::Finished(AcquisitionOutcome::Cancelled))
        );
        assert_eq!(handle.state(), AcquisitionState::Cancelled);

        // The blocked query completes later; nothing more may arrive
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(handle.next_update().await.is_none());
        assert_eq!(handle.outcome().await, AcquisitionOutcome::Cancelled);
    }

    /// Provider whose polls block far longer than the query timeout.
    #[derive(Default)]
    struct HangingProvider {
        calls: std::sync::atomic::AtomicUsize,
        active: std::sync::atomic::AtomicUsize,
        max_active: std::sync::atomic::AtomicUsize,
    }

    impl LocationProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Gps
        }

        fn is_enabled(&self) -> bool {
            true
        }

        fn last_known_fix(&self) -> Option<LocationFix> {
            use std::sync::atomic::Ordering;

            // The start-up read answers at once
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return None;
            }
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            self.active.fetch_sub(1, Ordering::SeqCst);
            None
        }
    }

    #[tokio::test]
    async fn test_timed_out_query_is_not_repeated_while_running() {
        use std::sync::atomic::Ordering;

        let hanging = Arc::new(HangingProvider::default());
        let provider: Arc<dyn LocationProvider> = hanging.clone();
        let settings = AcquisitionSettings {
            timeout: Duration::from_millis(500),
            query_timeout: Duration::from_millis(30),
            ..fast_settings()
        };
        let handle = LocationSession::new(backend(vec![provider]), settings).start();

        assert_eq!(
            handle.outcome().await,
            AcquisitionOutcome::Failed(AcquisitionFailure::NoFixObtained)
        );
        assert!(hanging.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(hanging.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_after_finish_is_harmless() {
        let gps = ScriptedProvider::new(ProviderKind::Gps, &[None, Some(5.0)]);
        let mut handle = LocationSession::new(backend(vec![gps]), fast_settings()).start();
        drain(&mut handle).await;
        handle.stop();
        assert!(matches!(
            handle.outcome().await,
            AcquisitionOutcome::Done(_)
        ));
    }
}
