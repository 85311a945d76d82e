//! Tracing middleware binding a request-scoped call identifier.
//!
//! The identifier comes from the `Nav-Call-Id` request header or is
//! generated. It is stored in task-local storage for the lifetime of the
//! request, echoed on the response and attached to a request span.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info_span};

use crate::domain::{CALL_ID_HEADER, CallId};

/// Middleware scoping a [`CallId`] around every request and adding a
/// `Nav-Call-Id` header to every response.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use innsyn_api::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

fn call_id_for(req: &ServiceRequest) -> CallId {
    req.headers()
        .get(CALL_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or_else(CallId::generate, CallId::from_header)
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let call_id = call_id_for(&req);
        let span = info_span!(
            "request",
            call_id = call_id.as_str(),
            method = %req.method(),
            path = req.path(),
        );
        let header_value = call_id.to_string();
        let fut = self.service.call(req);
        Box::pin(CallId::scope(
            call_id,
            async move {
                let mut res = fut.await?;
                match HeaderValue::from_str(&header_value) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static("nav-call-id"), value);
                    }
                    Err(error) => {
                        error!(%error, "failed to encode call identifier header");
                    }
                }
                Ok(res)
            }
            .instrument(span),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};
    use uuid::Uuid;

    async fn call_with_handler<F, Fut, Res>(
        handler: F,
        call_id: Option<&str>,
    ) -> (
        actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
        String,
    )
    where
        F: Fn() -> Fut + Clone + 'static,
        Fut: std::future::Future<Output = Res> + 'static,
        Res: actix_web::Responder + 'static,
    {
        let app =
            test::init_service(App::new().wrap(Trace).route("/", web::get().to(handler))).await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(id) = call_id {
            req = req.insert_header((CALL_ID_HEADER, id));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let echoed = res
            .headers()
            .get(CALL_ID_HEADER)
            .expect("call id header")
            .to_str()
            .expect("header is ascii")
            .to_owned();
        (res, echoed)
    }

    #[actix_web::test]
    async fn generates_call_id_when_header_is_missing() {
        let (_, echoed) = call_with_handler(|| async { HttpResponse::Ok().finish() }, None).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
    }

    #[actix_web::test]
    async fn reuses_incoming_call_id() {
        let (_, echoed) =
            call_with_handler(|| async { HttpResponse::Ok().finish() }, Some("frontend-42")).await;
        assert_eq!(echoed, "frontend-42");
    }

    #[actix_web::test]
    async fn exposes_call_id_in_handler() {
        let (res, echoed) = call_with_handler(
            || async move {
                let id = CallId::current().expect("call id in scope");
                HttpResponse::Ok().body(id.to_string())
            },
            Some("abc-123"),
        )
        .await;
        let body = test::read_body(res).await;
        assert_eq!(std::str::from_utf8(&body).expect("utf8 body"), echoed);
    }

    #[actix_web::test]
    async fn errors_carry_the_call_id() {
        use crate::domain::{ApiResult, Error};
        use serde_json::Value;

        let (res, _) = call_with_handler(
            || async move { ApiResult::<HttpResponse>::Err(Error::pdl("Noe uventet feilet")) },
            Some("call-7"),
        )
        .await;
        assert_eq!(res.status().as_u16(), 500);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["type"], "pdl_error");
    }
}
