use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs every request with its outcome and latency, and tags the response
/// with a fresh request ID.
#[derive(Clone, Copy, Default)]
pub struct RequestLogging;

impl<S> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RequestLoggingService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggingService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let start_time = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        Box::pin(async move {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let client_ip = req.connection_info().peer_addr().unwrap_or("unknown").to_string();

            let res = service.call(req).await;
            let response_time_ms = start_time.elapsed().as_millis();

            match res {
                Ok(mut res) => {
                    let status = res.status();
                    log::info!(
                        "Request processed: {method} {uri} - Status: {status} - Time: {response_time_ms}ms - IP: {client_ip} - Request ID: {request_id}"
                    );
                    if let Ok(value) = HeaderValue::from_str(&request_id) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }
                    Ok(res)
                }
                Err(e) => {
                    log::error!(
                        "Request failed: {method} {uri} - Error: {e} - Time: {response_time_ms}ms - IP: {client_ip} - Request ID: {request_id}"
                    );
                    Err(e)
                }
            }
        })
    }
}
