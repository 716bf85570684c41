//! Location acquisition.
//!
//! A [`LocationSession`] polls the providers of a [`LocationBackend`] until
//! a reading is accurate enough, the timeout elapses, or the caller stops
//! it. The result is paired with SLD99 grid coordinates.
//!
//! ```text
//! Idle ─start─► Requesting ─► Polling ─┬─ good enough ─────────► Done(live)
//!                   │                  ├─ timeout ─► TimedOut ─┬► Done(best available)
//!                   │                  │                       └► Failed(no fix)
//!                   └─ denied / no provider ─► Failed
//!        stop() from Requesting or Polling ─► Cancelled
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use surveykml::location::{
//!     replay_backend, AcquisitionOutcome, AcquisitionSettings, LocationSession,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = replay_backend("fixes.csv".as_ref())?;
//! let handle = LocationSession::new(Arc::new(backend), AcquisitionSettings::default()).start();
//! if let AcquisitionOutcome::Done(fix) = handle.outcome().await {
//!     println!("{}", fix.summary());
//! }
//! # Ok(())
//! # }
//! ```

mod model;
mod provider;
mod replay;
mod session;
mod state;

pub use model::{BestFix, FixSource};
pub use provider::{Authorization, LocationBackend, LocationProvider, ProviderKind, StaticBackend};
pub use replay::{parse_replay, replay_backend, ReplayError, ReplayProvider};
pub use session::{
    Acquisition, AcquisitionSettings, LocationSession, SamplingError, SessionEvent, SessionHandle,
    SessionUpdate, Transition, DEFAULT_GOOD_ENOUGH_M, DEFAULT_HYSTERESIS_M, DEFAULT_POLL_INTERVAL,
    DEFAULT_QUERY_TIMEOUT, DEFAULT_TICK_INTERVAL, DEFAULT_TIMEOUT,
};
pub use state::{
    AcquisitionFailure, AcquisitionOutcome, AcquisitionState, FixQuality, LocationFix, SurveyFix,
};
