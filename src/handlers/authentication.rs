// Authentication middleware for the diarization API
//
// Verifies that incoming requests carry the bearer token configured through
// the environment. When no token is configured, authentication is disabled.
// OPTIONS requests are always allowed to support CORS pre-flight requests.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header,
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, info, warn};
use std::env;

/// Environment variable holding the expected bearer token
const API_TOKEN_VAR: &str = "DIARIZE_API_TOKEN";

/// The configured token, if any. Empty values count as unconfigured.
fn expected_token() -> Option<String> {
    env::var(API_TOKEN_VAR)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Middleware factory for authentication
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        if expected_token().is_none() {
            info!("No API token configured, authentication is disabled");
        }
        ok(AuthenticationMiddleware { service })
    }
}

/// Authentication middleware implementation
pub struct AuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip authentication for OPTIONS requests
        if req.method() == actix_web::http::Method::OPTIONS {
            debug!("OPTIONS request - bypassing authentication check");
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await });
        }

        if let Err(error) = authenticate(&req) {
            return Box::pin(async move { Err(error) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

/// Authenticate a request by checking the Authorization header against the
/// configured bearer token.
fn authenticate(req: &ServiceRequest) -> Result<(), Error> {
    let expected = match expected_token() {
        Some(token) => token,
        None => {
            debug!("Authentication disabled, allowing request");
            return Ok(());
        }
    };

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            warn!("Missing Authorization header");
            ErrorUnauthorized("Authorization header is required")
        })?;

    let header_str = header_value.to_str().map_err(|_| {
        warn!("Authorization header contains invalid characters");
        ErrorUnauthorized("Invalid Authorization header")
    })?;

    let token = header_str.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format, missing 'Bearer' prefix");
        ErrorUnauthorized("Invalid Authorization header format. Must be 'Bearer <token>'")
    })?;

    if token == expected {
        Ok(())
    } else {
        warn!("Rejected request with an invalid bearer token");
        Err(ErrorUnauthorized("Invalid bearer token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    // One test covers every case: the expected token lives in the process
    // environment, so splitting these would race under the parallel runner.
    #[actix_web::test]
    async fn bearer_token_checks() {
        env::set_var(API_TOKEN_VAR, "sekrit");

        let no_header = TestRequest::default().to_srv_request();
        assert!(authenticate(&no_header).is_err());

        let wrong_scheme = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic sekrit"))
            .to_srv_request();
        assert!(authenticate(&wrong_scheme).is_err());

        let wrong_token = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer nope"))
            .to_srv_request();
        assert!(authenticate(&wrong_token).is_err());

        let valid = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer sekrit"))
            .to_srv_request();
        assert!(authenticate(&valid).is_ok());

        // Unset token disables authentication entirely
        env::remove_var(API_TOKEN_VAR);
        let unauthenticated = TestRequest::default().to_srv_request();
        assert!(authenticate(&unauthenticated).is_ok());
    }
}
