use futures::future::{ok, ready, LocalBoxFuture, Ready};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    HttpResponse,
};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Adds CORS headers for a single configured origin (or `*`) and answers
/// preflight requests itself.
#[derive(Clone)]
pub struct Cors {
    origin: HeaderValue,
}

impl Cors {
    /// Falls back to `*` when `origin` is not a valid header value
    pub fn new(origin: &str) -> Self {
        let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            log::warn!("invalid CORS origin `{}`, allowing any origin", origin);
            HeaderValue::from_static("*")
        });

        Self { origin }
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );

        if self.origin != "*" {
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// Every `OPTIONS` request is answered here, with or without
/// `Access-Control-Request-Method`.
fn is_preflight(req: &ServiceRequest) -> bool {
    req.method() == Method::OPTIONS
}

pub struct CorsMiddleware<S> {
    service: S,
    cors: Cors,
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;

    type Error = actix_web::Error;

    type InitError = ();

    type Transform = CorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddleware {
            service,
            cors: self.clone(),
        })
    }
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;

    type Error = actix_web::Error;

    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_preflight(&req) {
            let mut res = HttpResponse::NoContent()
                .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                .finish();
            self.cors.write_headers(res.headers_mut());

            return Box::pin(ready(Ok(req.into_response(res.map_into_right_body()))));
        }

        let cors = self.cors.clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            cors.write_headers(res.headers_mut());

            Ok(res.map_into_left_body())
        })
    }
}
