//! Demo Mode Middleware
//!
//! Route layer that answers from fixtures before the handler runs, so no body
//! extraction, cache lookup or provider call happens in demo mode.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::DemoResponder;

/// Short-circuits the request with a demo fixture when demo mode is on.
pub async fn demo_intercept(
    State(demo): State<Arc<DemoResponder>>,
    request: Request,
    next: Next,
) -> Response {
    let fixture = demo.intercept(request.uri().path()).await;
    match fixture {
        Some(fixture) => fixture.into_response(),
        None => next.run(request).await,
    }
}
