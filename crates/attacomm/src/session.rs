//! One test session: load, gate, then drive the adapter protocol

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{HarnessProperties, SessionConfig};
use crate::definition::TestDefinition;
use crate::driver::{self, Dispatch, Driver, DriverOutcome, DriverState};
use crate::error::{AttaError, AttaResult};
use crate::events::{Events, SessionEvent};
use crate::fallback::FallbackReason;
use crate::gate::{self, DomReady};
use crate::loader::LoadParams;
use crate::reporter::{self, Harness, RunSummary, BATCH_CASE, LOADING_CASE};
use crate::transport::Transport;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The adapter ran every assertion and acknowledged `/end`
    Completed(RunSummary),
    /// Automation stopped; a human finishes the test
    Manual(FallbackReason),
    /// The test or the document never became ready
    LoadFailed(String),
    /// The assertion batch could not settle
    Aborted(String),
    /// `init()` was called before the session was ready
    NotReady,
}

#[derive(Debug)]
struct Loaded {
    definition: TestDefinition,
    test_name: String,
}

pub struct Session {
    config: SessionConfig,
    transport: Transport,
    harness: Arc<dyn Harness>,
    events: Events,
    state: watch::Sender<DriverState>,
    dispatch: Dispatch,
    loaded: OnceLock<Loaded>,
    started: AtomicBool,
}

impl Session {
    pub fn new(config: SessionConfig, harness: Arc<dyn Harness>, events: Events) -> AttaResult<Self> {
        config.validate()?;
        let transport = Transport::new(config.timeout)?;
        let (state, _) = watch::channel(DriverState::Loading);
        let dispatch = driver::adapter_dispatch(transport.clone(), config.endpoint("test"));
        Ok(Self {
            config,
            transport,
            harness,
            events,
            state,
            dispatch,
            loaded: OnceLock::new(),
            started: AtomicBool::new(false),
        })
    }

    #[cfg(test)]
    fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Hosting-framework properties, read-only
    pub fn properties(&self) -> Option<&HarnessProperties> {
        self.config.properties.as_ref()
    }

    pub fn state(&self) -> DriverState {
        self.state.borrow().clone()
    }

    /// Watch driver state transitions
    pub fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn definition(&self) -> Option<&TestDefinition> {
        self.loaded.get().map(|l| &l.definition)
    }

    /// Load and run: wait for the readiness gate, then drive the adapter
    pub async fn run(&self, params: &LoadParams, dom: DomReady) -> AttaResult<SessionOutcome> {
        if let Err(e) = self.load(params, dom).await {
            return Ok(SessionOutcome::LoadFailed(e.to_string()));
        }
        self.init().await
    }

    /// Wait for the document and the test definition.
    ///
    /// A failure is reported to the harness as a failed loading case and
    /// ends the session.
    pub async fn load(&self, params: &LoadParams, dom: DomReady) -> AttaResult<()> {
        match gate::wait_ready(dom, params, &self.transport).await {
            Ok(definition) => {
                let test_name = params
                    .name
                    .clone()
                    .or_else(|| params.test_file.clone())
                    .unwrap_or_else(|| definition.title().to_string());
                if self.loaded.set(Loaded { definition, test_name }).is_err() {
                    return Err(AttaError::AlreadyStarted);
                }
                info!("Session ready");
                Ok(())
            }
            Err(e) => {
                let message = format!("Loading of test components failed: {}", e);
                error!("{}", message);
                reporter::report_fatal(self.harness.as_ref(), LOADING_CASE, &message);
                self.events.emit(SessionEvent::LoadFailed { message });
                Err(e)
            }
        }
    }

    /// Run the adapter protocol once the session is ready.
    ///
    /// Before the gate opens this only warns and returns
    /// [`SessionOutcome::NotReady`]; no adapter call is made.
    pub async fn init(&self) -> AttaResult<SessionOutcome> {
        let Some(loaded) = self.loaded.get() else {
            warn!("Loading did not finish before init was called");
            self.events.emit(SessionEvent::NotReady);
            return Ok(SessionOutcome::NotReady);
        };
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AttaError::AlreadyStarted);
        }

        let driver = Driver::new(
            &self.config,
            &self.transport,
            &self.events,
            &self.state,
            &self.dispatch,
        );
        match driver
            .run(&loaded.definition, &loaded.test_name, self.harness.as_ref())
            .await
        {
            Ok(DriverOutcome::Completed(summary)) => Ok(SessionOutcome::Completed(summary)),
            Ok(DriverOutcome::Manual(reason)) => Ok(SessionOutcome::Manual(reason)),
            Err(e) => {
                let message = e.to_string();
                error!("{}", message);
                reporter::report_fatal(self.harness.as_ref(), BATCH_CASE, &message);
                self.events.emit(SessionEvent::LoadFailed {
                    message: message.clone(),
                });
                Ok(SessionOutcome::Aborted(message))
            }
        }
    }
}
