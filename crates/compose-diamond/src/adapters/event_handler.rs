//! # Event Handler Adapter
//!
//! Decodes JSON request envelopes by topic, hands them to the service and
//! encodes the answer.
//!
//! - Routes on the request topic
//! - Answers on the matching response topic
//! - Carries the envelope's correlation id through

use crate::errors::ServiceError;
use crate::events::{
    topics, CallRequestPayload, DiamondCutRequestPayload, LoupeRequestPayload,
};
use crate::ports::outbound::EventSink;
use crate::service::DiamondService;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Transport envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub correlation_id: Uuid,
    pub payload: serde_json::Value,
}

/// JSON front of a [`DiamondService`].
pub struct DiamondEventHandler<E: EventSink> {
    service: Arc<DiamondService<E>>,
}

impl<E: EventSink> DiamondEventHandler<E> {
    /// Create a new event handler.
    pub fn new(service: Arc<DiamondService<E>>) -> Self {
        Self { service }
    }

    /// Handles one request envelope and returns the response envelope.
    ///
    /// # Errors
    ///
    /// `UnknownTopic`, `SerializationError` for a malformed payload, or a
    /// service timeout.
    pub async fn handle(&self, request: Envelope) -> Result<Envelope, ServiceError> {
        let correlation_id = request.correlation_id;
        let (topic, payload) = match request.topic.as_str() {
            topics::DIAMOND_CUT_REQUEST => {
                let payload: DiamondCutRequestPayload = decode(request.payload)?;
                let response = self.service.handle_diamond_cut(correlation_id, payload).await?;
                (topics::DIAMOND_CUT_RESPONSE, encode(&response)?)
            }
            topics::CALL_REQUEST => {
                let payload: CallRequestPayload = decode(request.payload)?;
                let response = self.service.handle_call(correlation_id, payload).await?;
                (topics::CALL_RESPONSE, encode(&response)?)
            }
            topics::LOUPE_REQUEST => {
                let payload: LoupeRequestPayload = decode(request.payload)?;
                let response = self.service.handle_loupe(correlation_id, payload).await?;
                (topics::LOUPE_RESPONSE, encode(&response)?)
            }
            other => {
                warn!(topic = other, %correlation_id, "No handler for topic");
                return Err(ServiceError::UnknownTopic(other.to_string()));
            }
        };

        Ok(Envelope {
            topic: topic.to_string(),
            correlation_id,
            payload,
        })
    }

    /// Handles a raw JSON envelope.
    ///
    /// # Errors
    ///
    /// As [`Self::handle`], plus `SerializationError` for malformed JSON.
    pub async fn handle_json(&self, request: &str) -> Result<String, ServiceError> {
        let envelope: Envelope = serde_json::from_str(request)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        let response = self.handle(envelope).await?;
        serde_json::to_string(&response).map_err(|e| ServiceError::SerializationError(e.to_string()))
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ServiceError> {
    serde_json::from_value(value).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FacetCut;
    use crate::domain::value_objects::{Address, Bytes, Selector};
    use crate::events::{CallResponsePayload, DiamondCutResponsePayload, LoupeResponsePayload};
    use crate::service::create_test_service;

    const OWNER: Address = Address::from_low_u8(0x01);

    fn handler() -> DiamondEventHandler<crate::adapters::InMemoryEventLog> {
        let (service, _host) = create_test_service(OWNER).unwrap();
        DiamondEventHandler::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_cut_envelope_routed() {
        let handler = handler();
        let correlation_id = Uuid::new_v4();
        let request = Envelope {
            topic: topics::DIAMOND_CUT_REQUEST.to_string(),
            correlation_id,
            payload: serde_json::to_value(DiamondCutRequestPayload {
                caller: OWNER,
                cuts: vec![FacetCut::add(Address::from_low_u8(0x77), vec![Selector::from_u32(1)])],
                init: Address::ZERO,
                calldata: Bytes::new(),
            })
            .unwrap(),
        };

        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.topic, topics::DIAMOND_CUT_RESPONSE);
        assert_eq!(response.correlation_id, correlation_id);

        let payload: DiamondCutResponsePayload = serde_json::from_value(response.payload).unwrap();
        // The facet address holds no code.
        assert!(!payload.success);
        assert_eq!(payload.revert.unwrap().error, "NoBytecodeAtAddress");
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let handler = handler();
        let request = serde_json::to_string(&Envelope {
            topic: topics::LOUPE_REQUEST.to_string(),
            correlation_id: Uuid::new_v4(),
            payload: serde_json::to_value(LoupeRequestPayload::Facets).unwrap(),
        })
        .unwrap();

        let response: Envelope =
            serde_json::from_str(&handler.handle_json(&request).await.unwrap()).unwrap();
        let LoupeResponsePayload::Facets(facets) = serde_json::from_value(response.payload).unwrap()
        else {
            panic!("expected facets");
        };
        assert_eq!(facets.len(), 1);
    }

    #[tokio::test]
    async fn test_bare_transfer_envelope() {
        let handler = handler();
        let request = Envelope {
            topic: topics::CALL_REQUEST.to_string(),
            correlation_id: Uuid::new_v4(),
            payload: serde_json::json!({ "caller": OWNER, "calldata": Bytes::new() }),
        };

        let response = handler.handle(request).await.unwrap();
        let payload: CallResponsePayload = serde_json::from_value(response.payload).unwrap();
        assert!(payload.success);
        assert!(payload.output.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_topic_and_bad_payload() {
        let handler = handler();
        let unknown = handler
            .handle(Envelope {
                topic: "diamond.nope".to_string(),
                correlation_id: Uuid::new_v4(),
                payload: serde_json::Value::Null,
            })
            .await;
        assert!(matches!(unknown, Err(ServiceError::UnknownTopic(_))));

        let malformed = handler
            .handle(Envelope {
                topic: topics::CALL_REQUEST.to_string(),
                correlation_id: Uuid::new_v4(),
                payload: serde_json::json!({ "caller": 5 }),
            })
            .await;
        assert!(matches!(malformed, Err(ServiceError::SerializationError(_))));
    }
}
