//! ATTA communication client
//!
//! Drives an Assistive Technology Test Adapter (ATTA) over HTTP on behalf
//! of a hosted conformance test:
//! - Loads a declarative JSON test definition, inline or from a test file
//! - Waits for the document and the definition before touching the adapter
//! - Announces the test, streams its assertions and closes the run
//! - Reports results into the hosting test framework
//! - Falls back to manual testing when the adapter cannot run the test
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Session                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  load(params, dom_ready)                                    │
//! │    └── gate::wait_ready ── DOM ready ─┐                     │
//! │                         └─ loader ────┴─> TestDefinition    │
//! │  init()                                                     │
//! │    └── Driver                                               │
//! │          ├── POST {uri}/start  {test, title}                │
//! │          │     └── not READY / no API / unknown API         │
//! │          │           -> FallbackReason (manual mode)        │
//! │          ├── POST {uri}/test   one per assertion, joined    │
//! │          ├── reporter: one case, one assert per outcome     │
//! │          └── GET  {uri}/end    then harness.done()          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport: every call resolves; status 0 when unanswered,  │
//! │  rejects only on a non-2xx status                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod definition;
pub mod driver;
pub mod error;
pub mod events;
pub mod fallback;
pub mod gate;
pub mod loader;
pub mod protocol;
pub mod reporter;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use definition::{AssertionRecord, TestDefinition};
pub use driver::DriverState;
pub use error::{AttaError, AttaResult};
pub use events::{Events, SessionEvent};
pub use fallback::FallbackReason;
pub use gate::{dom_ready, DomReady, DomReadyTrigger};
pub use loader::LoadParams;
pub use reporter::{Harness, RecordingHarness, RunSummary};
pub use session::{Session, SessionOutcome};
