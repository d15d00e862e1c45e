//! # Spotwatch Core Library
//!
//! This library provides the core logic for the Spotwatch day-ahead price
//! watcher. It follows a CLI-first philosophy: everything the daemon does is
//! also reachable from the standalone CLI binary for one-off inspection.
//!
//! ## Architecture
//!
//! - **Pricing**: Tax adjustment and LOW/NORMAL/HIGH classification of hours
//! - **Streak**: Bounding of long runs of extreme hours to their best window
//! - **Events**: Single-pass derivation of regime transition events
//! - **Scheduler**: One-shot triggers that hand events to a notifier
//! - **Provider / Notifier**: Price sources and delivery channels
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`EventDeriver`]: Classified day to transition events
//! - [`TriggerScheduler`]: Per-day trigger book
//! - [`PriceWatcher`]: Daily refresh pipeline
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notifier;
pub mod pricing;
pub mod provider;
pub mod scheduler;
pub mod storage;
pub mod streak;
pub mod watcher;

pub use error::{ConfigError, CoreError, DeliveryError, ProviderError};
pub use events::{derive_events, ClosurePolicy, Derivation, EventDeriver, TransitionEvent};
pub use notifier::{Notification, Notifier, NotifierKind};
pub use pricing::{classify_day, HourPoint, PriceClass, RawHour, Thresholds};
pub use provider::{JsonFileProvider, NordPoolProvider, PriceProvider};
pub use scheduler::{ScheduledTrigger, TokioJobScheduler, TriggerScheduler};
pub use storage::Config;
pub use streak::{best_window, bound_run, BoundedRun, Direction};
pub use watcher::{derive_for, PriceWatcher, RefreshSummary};
