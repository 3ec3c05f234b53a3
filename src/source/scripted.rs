//! Scripted source for driving recorder cycles without a network.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::ObservationSource;
use crate::error::FetchError;
use crate::observation::{Granularity, Observation};

/// A source that replays pre-configured results in order.
///
/// Scores are stamped with the requested `now` at the configured granularity,
/// exactly like a live source would.
#[derive(Debug)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Decimal, FetchError>>>,
    granularity: Granularity,
    calls: Mutex<Vec<DateTime<Local>>>,
}

impl ScriptedSource {
    pub fn new(granularity: Granularity) -> Self {
        Self::with_responses(granularity, Vec::new())
    }

    pub fn with_responses(
        granularity: Granularity,
        responses: Vec<Result<Decimal, FetchError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            granularity,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue another result.
    pub fn push(&self, response: Result<Decimal, FetchError>) {
        self.responses.lock().push_back(response);
    }

    /// Times at which `fetch` was called.
    pub fn calls(&self) -> Vec<DateTime<Local>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ObservationSource for ScriptedSource {
    async fn fetch(&self, now: DateTime<Local>) -> Result<Observation, FetchError> {
        self.calls.lock().push(now);
        let next = self.responses.lock().pop_front();
        match next {
            Some(Ok(value)) => Ok(Observation::new(self.granularity.stamp(&now), value)),
            Some(Err(e)) => Err(e),
            None => Err(FetchError::Network("no scripted response left".to_string())),
        }
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
