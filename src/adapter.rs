//! Bridges Lambda invocation events into the axum router and back.
//!
//! The adapter only translates requests: no startup or shutdown hooks of the
//! application run inside an invocation.

use assure360_event::{EventError, InvocationEvent, InvocationResult};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::Response;
use lambda_runtime::LambdaEvent;
use thiserror::Error;
use tower::ServiceExt;

use crate::context::InvocationContext;

/// Largest response body a synchronous Lambda invocation may return.
const MAX_RESPONSE_BYTES: usize = 6 * 1024 * 1024;

/// Serves invocation events with an axum [`Router`].
#[derive(Clone, Debug)]
pub struct LambdaAdapter {
    router: Router,
}

impl LambdaAdapter {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Translates `event` into an HTTP request, routes it, and translates the
    /// response into the result shape the event's gateway expects.
    pub async fn call(
        &self,
        event: InvocationEvent,
        context: InvocationContext,
    ) -> Result<InvocationResult, AdapterError> {
        let origin = event.origin();
        tracing::debug!(
            request_id = %context.request_id,
            function = %context.function_name,
            version = %context.function_version,
            deadline_ms = context.deadline_ms,
            method = event.method(),
            path = event.path(),
            "handling invocation"
        );

        let mut request = event.into_request()?.map(Body::from);
        request.extensions_mut().insert(context);

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        let (parts, body) = response.into_parts();
        let body = to_bytes(body, MAX_RESPONSE_BYTES)
            .await
            .map_err(|err| AdapterError::Body(err.to_string()))?;

        Ok(InvocationResult::from_response(
            origin,
            Response::from_parts(parts, body),
        ))
    }

    /// Entry point used by the Lambda runtime.
    pub async fn handle(
        &self,
        event: LambdaEvent<InvocationEvent>,
    ) -> Result<InvocationResult, lambda_runtime::Error> {
        let (payload, context) = event.into_parts();
        let context = InvocationContext::from(&context);
        Ok(self.call(payload, context).await?)
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("failed to read response body: {0}")]
    Body(String),
}
