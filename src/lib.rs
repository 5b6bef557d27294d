//! In-process instrumentation for a remote-display server.
//!
//! Times recurring work units (the frame update loop, input-event
//! processing, frame-data encoding passes), samples memory on an interval,
//! counts outbound bytes, folds the streams into a small fixed set of
//! metrics, and periodically dumps reports plus raw sample CSVs to disk.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod measure;
pub mod memory;
pub mod metrics;
pub mod network;
pub mod recorder;

pub use clock::EpochClock;
pub use config::StatsConfig;
pub use context::{StatsContext, StatsSnapshot};
pub use error::StatsError;
pub use measure::{Measurement, Sample, Span};
pub use recorder::{Recorder, RecorderReport};
