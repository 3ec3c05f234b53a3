//! # feargreed-recorder
//!
//! A periodic recorder for the CNN Fear & Greed index.
//!
//! Once per cycle the recorder fetches the current score, checks it against
//! the last stored row, writes it to a CSV record file and publishes the file
//! to a git remote.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Recorder                            │
//! │  ┌─────────┐    ┌─────────┐    ┌─────────┐    ┌───────────┐  │
//! │  │ source  │───▶│  guard  │───▶│  store  │───▶│  publish  │  │
//! │  │ (fetch) │    │ (dedup) │    │  (CSV)  │    │   (git)   │  │
//! │  └─────────┘    └─────────┘    └─────────┘    └───────────┘  │
//! │       ▲                                              │       │
//! │       └────────────── sleep(cycle period) ◀──────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`ObservationSource`] trait, the HTTP [`CnnSource`] and a
//!   [`ScriptedSource`] for tests
//! - **[`store`]**: the [`RecordStore`] and its [`DuplicateGuard`]
//! - **[`publish`]**: the [`Publisher`] with one forced-push retry, over a
//!   [`VersionControl`] backend ([`GitCli`] or [`MockVcs`])
//! - **[`recorder`]**: the cycle itself, [`Recorder::run_once`] and
//!   [`Recorder::run_forever`]
//!
//! ## Persistence policies
//!
//! Exactly one [`PersistencePolicy`] is active per run:
//!
//! | policy             | file contents                                   |
//! |--------------------|-------------------------------------------------|
//! | `overwrite`        | `date,index` header and the latest row only     |
//! | `append-daily`     | `timestamp,index` header, one row per day       |
//! | `append-timestamp` | `timestamp,index` header, one row per run       |
//! | `append-ohlc`      | no header, `date,v,v,v,v,0` rows, one per day   |
//!
//! ## Usage
//!
//! ```bash
//! # Record every hour and push to origin/main
//! feargreed-recorder
//!
//! # One cycle, local file only
//! feargreed-recorder --once --no-publish --file data/fg.csv
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::time::Duration;
//! use chrono::Local;
//! use feargreed_recorder::{
//!     Granularity, MockVcs, PersistencePolicy, Publisher, RecordStore, Recorder, ScriptedSource,
//! };
//! use rust_decimal::Decimal;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let source = ScriptedSource::with_responses(Granularity::Date, vec![Ok(Decimal::new(6235, 2))]);
//! let store = RecordStore::new(dir.path().join("fg.csv"), PersistencePolicy::AppendOhlc);
//! let publisher = Publisher::new(MockVcs::new(), "origin", "main");
//!
//! let recorder = Recorder::new(source, store, Some(publisher), Duration::from_secs(3600));
//! let outcome = recorder.run_once(Local::now()).await;
//! assert!(outcome.wrote());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod observation;
pub mod publish;
pub mod recorder;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use config::{PersistencePolicy, RecorderConfig, DEFAULT_SOURCE_URL};
pub use error::{FetchError, PublishError, StoreError, VcsError};
pub use observation::{round_score, Granularity, Observation};
pub use publish::{GitCli, MockVcs, Publisher, VcsCall, VersionControl};
pub use recorder::{stop_signal, CycleOutcome, Recorder, StopHandle};
pub use source::{CnnSource, ObservationSource, ScriptedSource};
pub use store::{DuplicateGuard, RecordStore};
