//! Readiness gate: the document and the test definition must both be ready

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::definition::TestDefinition;
use crate::error::{AttaError, AttaResult};
use crate::loader::{load_test, LoadParams};
use crate::transport::Transport;

/// Fires the one-shot DOM-ready signal
#[derive(Debug)]
pub struct DomReadyTrigger(oneshot::Sender<()>);

impl DomReadyTrigger {
    pub fn fire(self) {
        // The receiver is gone only if the session already failed.
        let _ = self.0.send(());
    }
}

/// Waits for the DOM-ready signal
#[derive(Debug)]
pub struct DomReady(oneshot::Receiver<()>);

impl DomReady {
    /// A signal that has already fired, for hosts without a document
    pub fn fired() -> Self {
        let (trigger, ready) = dom_ready();
        trigger.fire();
        ready
    }

    async fn wait(self) -> AttaResult<()> {
        self.0.await.map_err(|_| AttaError::DocumentClosed)
    }
}

/// Create a linked DOM-ready trigger and signal
pub fn dom_ready() -> (DomReadyTrigger, DomReady) {
    let (tx, rx) = oneshot::channel();
    (DomReadyTrigger(tx), DomReady(rx))
}

/// Wait until the DOM is ready and the test is loaded, in either order.
///
/// Fails as soon as either side fails; nothing is retried.
pub async fn wait_ready(
    dom: DomReady,
    params: &LoadParams,
    transport: &Transport,
) -> AttaResult<TestDefinition> {
    let document = async move {
        dom.wait().await?;
        debug!("DOM content loaded");
        Ok::<_, AttaError>(())
    };
    let test = async move {
        let definition = load_test(params, transport).await?.into_definition()?;
        info!(
            title = definition.title(),
            apis = definition.apis.len(),
            "Test loaded"
        );
        if let Some(description) = &definition.description {
            debug!("Description: {}", description);
        }
        Ok::<_, AttaError>(definition)
    };

    let ((), definition) = tokio::try_join!(document, test)?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn transport() -> Transport {
        Transport::new(Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn test_waits_for_late_dom() {
        let (trigger, ready) = dom_ready();
        let params = LoadParams::inline(json!({ "title": "late dom", "ATK": [] }));
        let transport = transport();

        let gate = wait_ready(ready, &params, &transport);
        tokio::pin!(gate);

        // Test is loaded but the document is not.
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut gate)
            .await
            .is_err());

        trigger.fire();
        let definition = gate.await.unwrap();
        assert_eq!(definition.title(), "late dom");
    }

    #[tokio::test]
    async fn test_fails_fast_on_load_error() {
        let (_trigger, ready) = dom_ready();
        let err = wait_ready(ready, &LoadParams::default(), &transport())
            .await
            .unwrap_err();
        assert!(matches!(err, AttaError::MissingTest));
    }

    #[tokio::test]
    async fn test_dropped_trigger_fails() {
        let (trigger, ready) = dom_ready();
        drop(trigger);
        let params = LoadParams::inline(json!({}));
        let err = wait_ready(ready, &params, &transport()).await.unwrap_err();
        assert!(matches!(err, AttaError::DocumentClosed));
    }
}
