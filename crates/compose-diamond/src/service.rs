//! # Diamond Service
//!
//! Async front of a single proxy. Requests are serialized behind one lock,
//! matching the one-call-at-a-time model of the proxy, and every committed
//! event is published to the configured [`EventSink`].
//!
//! ## Request flow
//!
//! 1. Acquire the proxy within `request_timeout_ms`
//! 2. Run the unit of work (all or nothing)
//! 3. Publish its events, update statistics
//! 4. Answer with a response payload; reverts are answers, not errors

use crate::adapters::{InMemoryEventLog, InMemoryFacetHost};
use crate::config::ServiceConfig;
use crate::diamond::{Diamond, DiamondArgs};
use crate::domain::entities::{CallOutcome, DiamondEvent, Facet, FacetCut, Message};
use crate::domain::value_objects::{Address, Bytes, Selector};
use crate::errors::{DiamondError, ServiceError};
use crate::events::{
    topics, CallRequestPayload, CallResponsePayload, DiamondCutRequestPayload,
    DiamondCutResponsePayload, LoupeRequestPayload, LoupeResponsePayload, RevertPayload,
};
use crate::ports::inbound::{ApiResult, DiamondApi};
use crate::ports::outbound::{EventSink, FacetHost};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Statistics for the Diamond Service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Batch cuts committed.
    pub cuts_applied: u64,
    /// Batch cuts rejected.
    pub cuts_rejected: u64,
    /// Calls routed successfully.
    pub calls_dispatched: u64,
    /// Calls that reverted.
    pub calls_reverted: u64,
    /// Requests handled (cuts and calls).
    pub requests_handled: u64,
    /// Average handling time in microseconds.
    pub avg_handling_time_us: u64,
}

#[derive(Clone, Copy)]
enum RequestKind {
    Cut,
    Call,
}

/// The Diamond Service.
pub struct DiamondService<E: EventSink> {
    /// Service configuration.
    config: ServiceConfig,
    /// The proxy.
    diamond: Arc<RwLock<Diamond>>,
    /// Where committed events go.
    sink: Arc<E>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<E: EventSink> DiamondService<E> {
    /// Wraps an already deployed proxy.
    pub fn new(diamond: Diamond, sink: E, config: ServiceConfig) -> Self {
        Self {
            config,
            diamond: Arc::new(RwLock::new(diamond)),
            sink: Arc::new(sink),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Deploys a proxy with `config.diamond` and wraps it. Deployment events
    /// are published like any other.
    ///
    /// # Errors
    ///
    /// The deployment failure.
    pub fn deploy(
        args: DiamondArgs,
        host: Arc<dyn FacetHost>,
        sink: E,
        config: ServiceConfig,
    ) -> Result<Self, DiamondError> {
        let (diamond, outcome) = Diamond::deploy(args, host, config.diamond.clone())?;
        let service = Self::new(diamond, sink, config);
        service.publish(&outcome.events);
        Ok(service)
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// The event sink.
    #[must_use]
    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the proxy.
    #[must_use]
    pub fn diamond(&self) -> Arc<RwLock<Diamond>> {
        Arc::clone(&self.diamond)
    }

    /// Handle a batch-cut request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_diamond_cut(
        &self,
        correlation_id: Uuid,
        payload: DiamondCutRequestPayload,
    ) -> Result<DiamondCutResponsePayload, ServiceError> {
        info!(
            caller = %payload.caller,
            cuts = payload.cuts.len(),
            init = %payload.init,
            "Processing diamond cut request"
        );

        let result = self
            .cut(payload.caller, &payload.cuts, payload.init, payload.calldata)
            .await?;

        Ok(match result {
            Ok(outcome) => DiamondCutResponsePayload {
                success: true,
                events: outcome.events,
                revert: None,
            },
            Err(err) => DiamondCutResponsePayload {
                success: false,
                events: Vec::new(),
                revert: Some(RevertPayload::from(&err)),
            },
        })
    }

    /// Handle a routed call request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_call(
        &self,
        correlation_id: Uuid,
        payload: CallRequestPayload,
    ) -> Result<CallResponsePayload, ServiceError> {
        let message = Message {
            caller: payload.caller,
            value: payload.value,
            calldata: payload.calldata,
        };

        if self.config.enable_tracing {
            debug!(
                caller = %message.caller,
                selector = %message.selector(),
                value = %message.value,
                "Processing call request"
            );
        }

        Ok(match self.dispatch(message).await? {
            Ok(outcome) => CallResponsePayload {
                success: true,
                output: outcome.output,
                events: outcome.events,
                revert: None,
            },
            Err(err) => CallResponsePayload {
                success: false,
                output: Bytes::new(),
                events: Vec::new(),
                revert: Some(RevertPayload::from(&err)),
            },
        })
    }

    /// Handle a loupe query.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_loupe(
        &self,
        correlation_id: Uuid,
        payload: LoupeRequestPayload,
    ) -> Result<LoupeResponsePayload, ServiceError> {
        let diamond = self.read().await?;
        Ok(match payload {
            LoupeRequestPayload::Facets => LoupeResponsePayload::Facets(diamond.facets()),
            LoupeRequestPayload::FacetAddress { selector } => {
                LoupeResponsePayload::FacetAddress(diamond.facet_address(selector))
            }
            LoupeRequestPayload::FacetFunctionSelectors { facet } => {
                LoupeResponsePayload::FacetFunctionSelectors(diamond.facet_function_selectors(facet))
            }
        })
    }

    async fn cut(
        &self,
        caller: Address,
        cuts: &[FacetCut],
        init: Address,
        calldata: Bytes,
    ) -> ApiResult<CallOutcome> {
        let start = Instant::now();
        let result = {
            let mut diamond = self.write().await?;
            diamond.diamond_cut(caller, cuts, init, calldata.as_slice())
        };
        self.finish(RequestKind::Cut, &result, start).await;
        Ok(result)
    }

    async fn dispatch(&self, message: Message) -> ApiResult<CallOutcome> {
        let start = Instant::now();
        let result = {
            let mut diamond = self.write().await?;
            diamond.call(message)
        };
        self.finish(RequestKind::Call, &result, start).await;
        Ok(result)
    }

    async fn finish(
        &self,
        kind: RequestKind,
        result: &Result<CallOutcome, DiamondError>,
        start: Instant,
    ) {
        match result {
            Ok(outcome) => self.publish(&outcome.events),
            Err(err) => warn!(error = %err, "Request reverted"),
        }

        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        let mut stats = self.stats.write().await;
        match (kind, result.is_ok()) {
            (RequestKind::Cut, true) => stats.cuts_applied += 1,
            (RequestKind::Cut, false) => stats.cuts_rejected += 1,
            (RequestKind::Call, true) => stats.calls_dispatched += 1,
            (RequestKind::Call, false) => stats.calls_reverted += 1,
        }
        stats.requests_handled += 1;
        let total = stats.requests_handled;
        stats.avg_handling_time_us =
            (stats.avg_handling_time_us.saturating_mul(total - 1).saturating_add(elapsed_us)) / total;
    }

    fn publish(&self, events: &[DiamondEvent]) {
        for event in events {
            self.sink.publish(topics::for_event(event), event);
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    async fn write(&self) -> Result<RwLockWriteGuard<'_, Diamond>, ServiceError> {
        tokio::time::timeout(self.timeout(), self.diamond.write())
            .await
            .map_err(|_| ServiceError::Timeout {
                timeout_ms: self.config.request_timeout_ms,
            })
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, Diamond>, ServiceError> {
        tokio::time::timeout(self.timeout(), self.diamond.read())
            .await
            .map_err(|_| ServiceError::Timeout {
                timeout_ms: self.config.request_timeout_ms,
            })
    }
}

/// Create a service around an empty proxy with in-memory adapters (for testing).
///
/// # Errors
///
/// Never in practice; deploying without cuts cannot fail.
pub fn create_test_service(
    owner: Address,
) -> Result<(DiamondService<InMemoryEventLog>, Arc<InMemoryFacetHost>), DiamondError> {
    let host = Arc::new(InMemoryFacetHost::new());
    let args = DiamondArgs::new(Address::from_low_u8(0xd1), owner);
    let service = DiamondService::deploy(
        args,
        Arc::clone(&host) as Arc<dyn FacetHost>,
        InMemoryEventLog::new(),
        ServiceConfig::default(),
    )?;
    Ok((service, host))
}

// =============================================================================
// DiamondApi Implementation
// =============================================================================

#[async_trait]
impl<E: EventSink> DiamondApi for DiamondService<E> {
    async fn diamond_cut(
        &self,
        caller: Address,
        cuts: Vec<FacetCut>,
        init: Address,
        calldata: Bytes,
    ) -> ApiResult<CallOutcome> {
        self.cut(caller, &cuts, init, calldata).await
    }

    async fn call(&self, message: Message) -> ApiResult<CallOutcome> {
        self.dispatch(message).await
    }

    async fn facets(&self) -> Result<Vec<Facet>, ServiceError> {
        Ok(self.read().await?.facets())
    }

    async fn facet_address(&self, selector: Selector) -> Result<Option<Address>, ServiceError> {
        Ok(self.read().await?.facet_address(selector))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FnFacet;
    use crate::domain::value_objects::U256;
    use crate::errors::Revert;

    const OWNER: Address = Address::from_low_u8(0x01);
    const FACET: Address = Address::from_low_u8(0xf1);
    const PING: Selector = Selector::from_u32(0x5c36_b186);
    const FAIL: Selector = Selector::from_u32(0xa9cc_4718);

    fn facet() -> Arc<FnFacet> {
        Arc::new(FnFacet::new("ping", vec![PING, FAIL], |ctx| {
            if ctx.selector() == FAIL {
                return Err(Revert::with_payload(vec![0xde, 0xad]));
            }
            Ok(Bytes::from(vec![0x01]))
        }))
    }

    async fn service_with_facet() -> DiamondService<InMemoryEventLog> {
        let (service, host) = create_test_service(OWNER).unwrap();
        host.deploy(FACET, facet());
        let response = service
            .handle_diamond_cut(
                Uuid::new_v4(),
                DiamondCutRequestPayload {
                    caller: OWNER,
                    cuts: vec![FacetCut::add(FACET, vec![PING, FAIL])],
                    init: Address::ZERO,
                    calldata: Bytes::new(),
                },
            )
            .await
            .unwrap();
        assert!(response.success);
        service
    }

    fn call(caller: Address, selector: Selector) -> CallRequestPayload {
        CallRequestPayload {
            caller,
            value: U256::zero(),
            calldata: Bytes::from(selector.0.to_vec()),
        }
    }

    #[tokio::test]
    async fn test_cut_publishes_event() {
        let service = service_with_facet().await;

        let published = service.sink().take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, topics::DIAMOND_CUT);

        let stats = service.stats().await;
        assert_eq!(stats.cuts_applied, 1);
        assert_eq!(stats.requests_handled, 1);
    }

    #[tokio::test]
    async fn test_call_success_and_revert() {
        let service = service_with_facet().await;

        let ok = service
            .handle_call(Uuid::new_v4(), call(OWNER, PING))
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.output, Bytes::from(vec![0x01]));

        let reverted = service
            .handle_call(Uuid::new_v4(), call(OWNER, FAIL))
            .await
            .unwrap();
        assert!(!reverted.success);
        assert_eq!(reverted.revert.unwrap().data, Bytes::from(vec![0xde, 0xad]));

        let stats = service.stats().await;
        assert_eq!(stats.calls_dispatched, 1);
        assert_eq!(stats.calls_reverted, 1);
    }

    #[tokio::test]
    async fn test_unknown_selector_reported() {
        let service = service_with_facet().await;
        let response = service
            .handle_call(Uuid::new_v4(), call(OWNER, Selector::from_u32(0x0bad_f00d)))
            .await
            .unwrap();

        let revert = response.revert.unwrap();
        assert_eq!(revert.error, "FunctionDoesNotExist");
    }

    #[tokio::test]
    async fn test_unauthorized_cut_rejected() {
        let service = service_with_facet().await;
        service.sink().take();

        let response = service
            .handle_diamond_cut(
                Uuid::new_v4(),
                DiamondCutRequestPayload {
                    caller: Address::from_low_u8(0x66),
                    cuts: vec![FacetCut::remove(vec![PING])],
                    init: Address::ZERO,
                    calldata: Bytes::new(),
                },
            )
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.revert.unwrap().error, "Unauthorized");
        assert!(service.sink().is_empty());
        assert_eq!(service.stats().await.cuts_rejected, 1);
        assert_eq!(service.facet_address(PING).await.unwrap(), Some(FACET));
    }

    #[tokio::test]
    async fn test_loupe_queries() {
        let service = service_with_facet().await;

        let facets = service
            .handle_loupe(Uuid::new_v4(), LoupeRequestPayload::Facets)
            .await
            .unwrap();
        let LoupeResponsePayload::Facets(facets) = facets else {
            panic!("expected facets");
        };
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[1].facet_address, FACET);

        let selectors = service
            .handle_loupe(
                Uuid::new_v4(),
                LoupeRequestPayload::FacetFunctionSelectors { facet: FACET },
            )
            .await
            .unwrap();
        assert_eq!(
            selectors,
            LoupeResponsePayload::FacetFunctionSelectors(vec![PING, FAIL])
        );
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (mut service, _host) = create_test_service(OWNER).unwrap();
        service.config.request_timeout_ms = 10;

        let handle = service.diamond();
        let _guard = handle.write().await;

        let result = service.handle_call(Uuid::new_v4(), call(OWNER, PING)).await;
        assert!(matches!(result, Err(ServiceError::Timeout { timeout_ms: 10 })));
    }

    #[tokio::test]
    async fn test_api_trait_round_trip() {
        let service = service_with_facet().await;
        let api: &dyn DiamondApi = &service;

        let outcome = api
            .call(Message::new(OWNER, PING.0.to_vec()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.output, Bytes::from(vec![0x01]));
        assert_eq!(api.facets().await.unwrap().len(), 2);
    }
}
