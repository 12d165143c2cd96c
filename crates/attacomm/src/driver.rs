//! Adapter protocol driver
//!
//! ```text
//! LOADING -> INIT -> AWAIT_START -> AWAIT_API -> RUNNING_ASSERTIONS -> ENDING -> DONE
//!                         |              |
//!                         +--------------+--> MANUAL
//! ```
//!
//! `MANUAL`, `ABORTED` and `DONE` are terminal; `ABORTED` is entered from
//! `RUNNING_ASSERTIONS` when the batch cannot settle. No `/test` call is made before the
//! adapter answers READY with a known API, and `/end` is only called once
//! every assertion for that API has settled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::definition::{AssertionRecord, TestDefinition};
use crate::error::{AttaError, AttaResult};
use crate::events::{Events, SessionEvent};
use crate::fallback::{self, FallbackReason};
use crate::protocol::{OutcomeKind, OutcomeRecord, StartReply, StartRequest, StartResponse};
use crate::reporter::{self, Harness, RunSummary};
use crate::transport::{RequestBody, Transport};

/// Pending result of one assertion
pub type AssertionFuture = Pin<Box<dyn Future<Output = OutcomeRecord> + Send>>;

/// Sends assertion `index` to the adapter and classifies the reply
pub type Dispatch = Arc<dyn Fn(usize, AssertionRecord) -> AssertionFuture + Send + Sync>;

/// Dispatch that posts each assertion to `url`
pub fn adapter_dispatch(transport: Transport, url: String) -> Dispatch {
    let url = Arc::new(url);
    Arc::new(move |index: usize, record: AssertionRecord| -> AssertionFuture {
        let transport = transport.clone();
        let url = Arc::clone(&url);
        Box::pin(async move {
            let reply = transport.post(&url, RequestBody::Text(record.to_wire())).await;
            OutcomeRecord::from_reply(index, reply)
        })
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DriverState {
    Loading,
    Init,
    AwaitStart,
    AwaitApi { api: String },
    RunningAssertions { api: String },
    Ending,
    Done,
    Manual { reason: FallbackReason },
    Aborted { message: String },
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DriverState::Done | DriverState::Manual { .. } | DriverState::Aborted { .. }
        )
    }
}

/// How a protocol run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
    Completed(RunSummary),
    Manual(FallbackReason),
}

pub struct Driver<'a> {
    config: &'a SessionConfig,
    transport: &'a Transport,
    events: &'a Events,
    state: &'a watch::Sender<DriverState>,
    dispatch: &'a Dispatch,
}

impl<'a> Driver<'a> {
    pub fn new(
        config: &'a SessionConfig,
        transport: &'a Transport,
        events: &'a Events,
        state: &'a watch::Sender<DriverState>,
        dispatch: &'a Dispatch,
    ) -> Self {
        Self {
            config,
            transport,
            events,
            state,
            dispatch,
        }
    }

    fn transition(&self, next: DriverState) {
        let from = self.state.send_replace(next.clone());
        debug!(?from, to = ?next, "Driver transition");
    }

    /// Run the whole protocol for a loaded definition.
    ///
    /// An error leaves the driver in [`DriverState::Aborted`] without calling
    /// `/end`; reporting the failure is left to the caller.
    pub async fn run(
        &self,
        definition: &TestDefinition,
        test_name: &str,
        harness: &dyn Harness,
    ) -> AttaResult<DriverOutcome> {
        let result = self.drive(definition, test_name, harness).await;
        if let Err(e) = &result {
            self.transition(DriverState::Aborted {
                message: e.to_string(),
            });
        }
        result
    }

    async fn drive(
        &self,
        definition: &TestDefinition,
        test_name: &str,
        harness: &dyn Harness,
    ) -> AttaResult<DriverOutcome> {
        self.transition(DriverState::Init);

        let announce = RequestBody::json(&StartRequest {
            test: test_name,
            title: definition.title(),
        })?;
        let api = match self.start(definition, announce).await {
            Ok(api) => api,
            Err(reason) => {
                self.fall_back(reason.clone());
                return Ok(DriverOutcome::Manual(reason));
            }
        };

        // Checked in start(); the assertions come from the loaded definition.
        let records = definition.assertions(&api).unwrap_or_default().to_vec();
        self.transition(DriverState::RunningAssertions { api: api.clone() });
        let outcomes = self.run_assertions(records).await?;

        reporter::report_outcomes(harness, definition.title(), &outcomes);
        let summary = RunSummary::from_outcomes(&api, &outcomes);

        self.transition(DriverState::Ending);
        self.end().await;

        self.transition(DriverState::Done);
        harness.done();
        info!(
            api = %summary.api,
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.errors,
            "Test run complete"
        );
        Ok(DriverOutcome::Completed(summary))
    }

    /// Announce the test and resolve the API to exercise
    async fn start(
        &self,
        definition: &TestDefinition,
        announce: RequestBody,
    ) -> Result<String, FallbackReason> {
        self.transition(DriverState::AwaitStart);
        let resp = self
            .transport
            .post(&self.config.endpoint("start"), announce)
            .await
            .map_err(FallbackReason::rejected)?;

        if resp.is_unanswered() {
            return Err(FallbackReason::unanswered(&self.config.adapter_uri, &resp));
        }

        match StartResponse::from_body(resp.body.as_ref()).classify() {
            StartReply::Ready { api } if definition.has_api(&api) => {
                info!("ATTA ready for API {}", api);
                self.transition(DriverState::AwaitApi { api: api.clone() });
                Ok(api)
            }
            StartReply::Ready { api } => Err(FallbackReason::UnknownApi { api }),
            other => Err(FallbackReason::from_start_reply(other)
                .unwrap_or(FallbackReason::MissingStatus)),
        }
    }

    /// Send every assertion at once and wait for all of them to settle
    async fn run_assertions(&self, records: Vec<AssertionRecord>) -> AttaResult<Vec<OutcomeRecord>> {
        let mut batch = JoinSet::new();

        for (offset, record) in records.into_iter().enumerate() {
            let index = offset + 1;
            let events = self.events.clone();
            let pending = (self.dispatch)(index, record);

            batch.spawn(async move {
                let outcome = pending.await;
                debug!(index, kind = ?outcome.kind, "Assertion settled");
                if outcome.kind == OutcomeKind::Error {
                    let message = outcome.message.clone().unwrap_or_default();
                    warn!("ATTA error on assertion {}: {}", index, message);
                    events.emit(SessionEvent::AdapterError { index, message });
                }
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    batch.abort_all();
                    return Err(AttaError::Batch(e.to_string()));
                }
            }
        }
        outcomes.sort_by_key(|o| o.index);
        Ok(outcomes)
    }

    /// Tell the adapter the run is over; the reply is not interpreted
    async fn end(&self) {
        match self.transport.get(&self.config.endpoint("end")).await {
            Ok(resp) if resp.is_unanswered() => warn!("ATTA did not answer /end"),
            Ok(_) => debug!("ATTA acknowledged /end"),
            Err(e) => warn!("ATTA rejected /end: {}", e),
        }
    }

    fn fall_back(&self, reason: FallbackReason) {
        warn!("{}", fallback::notice(&reason));
        self.transition(DriverState::Manual {
            reason: reason.clone(),
        });
        self.events.emit(SessionEvent::ManualFallback { reason });
    }
}
