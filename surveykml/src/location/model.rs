//! Best-fix tracking with accuracy hysteresis.

use super::state::LocationFix;

/// Where the current best fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixSource {
    /// Last-known reading collected when the session started
    Seed,
    /// Reading returned by a poll
    Polled,
}

/// The most accurate fix seen in one session.
///
/// A new reading replaces the best one only if its accuracy radius is
/// smaller by more than `margin` meters, which keeps similar readings from
/// flapping back and forth.
#[derive(Debug, Clone)]
pub struct BestFix {
    margin: f64,
    current: Option<(LocationFix, FixSource)>,
}

impl BestFix {
    pub fn new(margin: f64) -> Self {
        Self {
            margin: margin.max(0.0),
            current: None,
        }
    }

    /// Offer a last-known reading. The most accurate seed wins outright.
    pub fn seed(&mut self, fix: LocationFix) -> bool {
        if !fix.is_usable() {
            return false;
        }
        let better = match &self.current {
            Some((best, _)) => fix.accuracy < best.accuracy,
            None => true,
        };
        if better {
            self.current = Some((fix, FixSource::Seed));
        }
        better
    }

    /// Offer a polled reading. Returns true if it became the best fix.
    pub fn offer(&mut self, fix: LocationFix) -> bool {
        if !fix.is_usable() {
            return false;
        }
        let accepted = match &self.current {
            Some((best, _)) => fix.accuracy < best.accuracy - self.margin,
            None => true,
        };
        if accepted {
            self.current = Some((fix, FixSource::Polled));
        }
        accepted
    }

    pub fn get(&self) -> Option<&LocationFix> {
        self.current.as_ref().map(|(fix, _)| fix)
    }

    pub fn source(&self) -> Option<FixSource> {
        self.current.as_ref().map(|(_, source)| *source)
    }

    /// True if the best fix, seeded or polled, is within `threshold` meters.
    pub fn is_within(&self, threshold: f64) -> bool {
        self.get().is_some_and(|fix| fix.accuracy <= threshold)
    }

    pub fn into_inner(self) -> Option<LocationFix> {
        self.current.map(|(fix, _)| fix)
    }
}
