//! Indicator source abstraction.
//!
//! A recorder asks its [`ObservationSource`] for one observation per cycle.
//! [`CnnSource`] talks to the public CNN graph-data endpoint, while
//! [`ScriptedSource`] replays canned results so cycles can be driven in tests.

mod cnn;
mod scripted;

pub use cnn::{parse_score, CnnSource, CnnSourceBuilder};
pub use scripted::ScriptedSource;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::FetchError;
use crate::observation::Observation;

/// Trait for retrieving the indicator.
///
/// # Example
///
/// ```no_run
/// use chrono::Local;
/// use feargreed_recorder::{CnnSource, ObservationSource};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let source = CnnSource::builder().build()?;
/// let obs = source.fetch(Local::now()).await?;
/// println!("{}", obs);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch the indicator for the date of `now`.
    ///
    /// Implementations make a single attempt; retrying is left to the next
    /// scheduled cycle.
    async fn fetch(&self, now: DateTime<Local>) -> Result<Observation, FetchError>;

    /// Returns a human-readable description of the source, used in logs.
    fn description(&self) -> &str;
}
