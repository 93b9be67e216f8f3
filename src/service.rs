//! Assistant service and its lifecycle.
//!
//! The service is built once with its collaborators injected and moves
//! through `Uninitialized -> Initializing -> Ready`, or `Failed` when
//! initialization does not complete. Queries are only answered in `Ready`.
//!
//! Valid transitions:
//! - Uninitialized -> Initializing
//! - Failed -> Initializing (retry)
//! - Initializing -> Ready
//! - Initializing -> Failed

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::chat::order_status::OrderStatusResponder;
use crate::errors::AssistantError;
use crate::index::{IndexSpec, VectorIndex};
use crate::orders::OrderStore;
use crate::transformers::providers::{prepare_generic_embedding_request, EmbeddingProvider};
use crate::transformers::types::Inputs;
use crate::util::ServiceConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            ServiceState::Uninitialized => write!(f, "uninitialized"),
            ServiceState::Initializing => write!(f, "initializing"),
            ServiceState::Ready => write!(f, "ready"),
            ServiceState::Failed => write!(f, "failed"),
        }
    }
}

pub fn validate_transition(from: ServiceState, to: ServiceState) -> Result<(), AssistantError> {
    let valid = matches!(
        (from, to),
        (ServiceState::Uninitialized, ServiceState::Initializing)
            | (ServiceState::Failed, ServiceState::Initializing)
            | (ServiceState::Initializing, ServiceState::Ready)
            | (ServiceState::Initializing, ServiceState::Failed)
    );
    if valid {
        Ok(())
    } else {
        Err(AssistantError::InvalidTransition(from, to))
    }
}

pub struct AssistantService {
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) index: Arc<dyn VectorIndex>,
    pub(crate) order_status: OrderStatusResponder,
    pub(crate) index_spec: IndexSpec,
    pub(crate) config: ServiceConfig,
    state: RwLock<ServiceState>,
}

impl AssistantService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        orders: Arc<dyn OrderStore>,
        index_spec: IndexSpec,
        config: ServiceConfig,
    ) -> Self {
        let order_status = OrderStatusResponder::new(orders, config.order_query_timeout);
        AssistantService {
            embedder,
            index,
            order_status,
            index_spec,
            config,
            state: RwLock::new(ServiceState::Uninitialized),
        }
    }

    pub fn state(&self) -> ServiceState {
        // state is Copy, so a poisoned lock still holds a whole value
        match self.state.read() {
            Ok(s) => *s,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ServiceState::Ready
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), AssistantError> {
        match self.state() {
            ServiceState::Ready => Ok(()),
            other => Err(AssistantError::NotReady(other)),
        }
    }

    /// Checks and applies a transition under one write lock.
    pub(crate) fn transition(&self, to: ServiceState) -> Result<(), AssistantError> {
        let mut state = match self.state.write() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        validate_transition(*state, to)?;
        log::info!("assistant state: {} -> {}", *state, to);
        *state = to;
        Ok(())
    }

    /// Embeds a batch of inputs, one vector per input, each of the index dimension.
    pub(crate) async fn embed(&self, inputs: &[Inputs]) -> Result<Vec<Vec<f64>>, AssistantError> {
        let request = prepare_generic_embedding_request(&self.config.embedding_model, inputs);
        let response = with_timeout(
            "embedding request",
            self.config.embedding_timeout,
            self.embedder.generate_embedding(&request),
        )
        .await?;
        if response.embeddings.len() != inputs.len() {
            return Err(AssistantError::Embedding(format!(
                "expected {} embeddings, received {}",
                inputs.len(),
                response.embeddings.len()
            )));
        }
        let expected = self.index_spec.dimension;
        if let Some(bad) = response.embeddings.iter().find(|e| e.len() != expected) {
            return Err(AssistantError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(response.embeddings)
    }
}

pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, AssistantError>
where
    F: Future<Output = Result<T, AssistantError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(AssistantError::Timeout {
            operation,
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(validate_transition(ServiceState::Uninitialized, ServiceState::Initializing).is_ok());
        assert!(validate_transition(ServiceState::Initializing, ServiceState::Ready).is_ok());
        assert!(validate_transition(ServiceState::Initializing, ServiceState::Failed).is_ok());
        assert!(validate_transition(ServiceState::Failed, ServiceState::Initializing).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(validate_transition(ServiceState::Uninitialized, ServiceState::Ready).is_err());
        assert!(validate_transition(ServiceState::Initializing, ServiceState::Initializing).is_err());
        assert!(validate_transition(ServiceState::Ready, ServiceState::Initializing).is_err());
        assert!(validate_transition(ServiceState::Ready, ServiceState::Failed).is_err());
        assert!(validate_transition(ServiceState::Failed, ServiceState::Ready).is_err());
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let res: Result<(), AssistantError> = with_timeout("slow call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            res,
            Err(AssistantError::Timeout {
                operation: "slow call",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_through() {
        let res = with_timeout("fast call", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }
}
