//! Transition events derived from a classified day.
//!
//! The deriver walks the day once, left to right, buffering the open run
//! of equally classified hours. Every classification change closes the
//! buffered run: the run is bounded, and an event is emitted for the first
//! hour of the kept window plus re-normalisation markers for clipped edges.
//!
//! Emission rules:
//! - the first run of the day emits nothing when it is NORMAL, since the
//!   visible state already starts out NORMAL;
//! - an event whose class equals the previously emitted one is dropped, so
//!   consecutive events always differ;
//! - the run still open when the day ends is flushed per [`ClosurePolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::{classify_day, HourPoint, PriceClass, RawHour, Thresholds};
use crate::streak::bound_run;

/// A reported change of the externally visible price regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub timestamp: DateTime<Utc>,
    /// Adjusted price of the hour the event fires at.
    pub value: f64,
    pub currency: String,
    pub class: PriceClass,
}

/// How the run still open at the end of the day is flushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosurePolicy {
    /// Emit one event for the run's first hour without bounding it.
    #[default]
    Unbounded,
    /// Bound the final run exactly like runs closed by a threshold crossing.
    Bounded,
}

/// Result of one derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// Every hour in order, with clipped run hours demoted to NORMAL.
    pub hours: Vec<HourPoint>,
    /// Ordered transition events.
    pub events: Vec<TransitionEvent>,
}

/// Turns a day of hours into transition events.
#[derive(Debug, Clone)]
pub struct EventDeriver<'a> {
    thresholds: &'a Thresholds,
    currency: String,
    closure: ClosurePolicy,
}

impl<'a> EventDeriver<'a> {
    pub fn new(thresholds: &'a Thresholds, currency: impl Into<String>) -> Self {
        Self {
            thresholds,
            currency: currency.into(),
            closure: ClosurePolicy::default(),
        }
    }

    pub fn with_closure(mut self, closure: ClosurePolicy) -> Self {
        self.closure = closure;
        self
    }

    /// Classify raw provider hours and derive their events.
    pub fn derive(&self, hours: &[RawHour]) -> Derivation {
        self.derive_classified(classify_day(hours, self.thresholds))
    }

    /// Derive events from hours that are already classified.
    pub fn derive_classified(&self, hours: Vec<HourPoint>) -> Derivation {
        let pass = hours
            .into_iter()
            .fold(Pass::new(), |pass, hour| pass.step(hour, self));
        pass.finish(self)
    }

    fn event_for(&self, hour: &HourPoint, class: PriceClass) -> TransitionEvent {
        TransitionEvent {
            timestamp: hour.timestamp,
            value: hour.adjusted_value,
            currency: self.currency.clone(),
            class,
        }
    }
}

/// Derive events with the default closure policy.
pub fn derive_events(hours: &[RawHour], thresholds: &Thresholds, currency: &str) -> Vec<TransitionEvent> {
    EventDeriver::new(thresholds, currency).derive(hours).events
}

/// State threaded through the single pass over the day.
struct Pass {
    previous: PriceClass,
    run: Vec<HourPoint>,
    closed: Vec<HourPoint>,
    events: Vec<TransitionEvent>,
}

impl Pass {
    fn new() -> Self {
        Self {
            previous: PriceClass::Normal,
            run: Vec::new(),
            closed: Vec::new(),
            events: Vec::new(),
        }
    }

    fn step(mut self, hour: HourPoint, deriver: &EventDeriver<'_>) -> Self {
        if hour.class != self.previous {
            if !self.run.is_empty() {
                self.close_run(deriver, true);
            }
            self.previous = hour.class;
        }
        self.run.push(hour);
        self
    }

    fn finish(mut self, deriver: &EventDeriver<'_>) -> Derivation {
        if !self.run.is_empty() {
            match deriver.closure {
                ClosurePolicy::Bounded => self.close_run(deriver, true),
                ClosurePolicy::Unbounded => self.close_run(deriver, false),
            }
        }
        Derivation {
            hours: self.closed,
            events: self.events,
        }
    }

    /// Close the buffered run, emitting its events in time order.
    fn close_run(&mut self, deriver: &EventDeriver<'_>, bound: bool) {
        let class = self.previous;
        let mut run = std::mem::take(&mut self.run);
        let limit = if bound {
            deriver.thresholds.run_limit(class)
        } else {
            None
        };
        let bounded = bound_run(&mut run, class, limit);

        if let Some(index) = bounded.leading_demotion() {
            self.push(deriver.event_for(&run[index], PriceClass::Normal));
        }
        if class.is_extreme() || !self.events.is_empty() {
            self.push(deriver.event_for(&run[bounded.first()], class));
        }
        if let Some(index) = bounded.trailing_demotion() {
            self.push(deriver.event_for(&run[index], PriceClass::Normal));
        }

        self.closed.append(&mut run);
    }

    fn push(&mut self, event: TransitionEvent) {
        if self.events.last().is_some_and(|last| last.class == event.class) {
            return;
        }
        self.events.push(event);
    }
}
