use std::{future::{ready, Ready}, rc::Rc, sync::Arc};
use actix_web::{body::EitherBody, dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform}, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::errors::ApiError;

use self::jwt::TokenKeys;

/// Identity of the caller, placed in request extensions by [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct UserAuthData {
    pub user_id: Uuid,
    pub name: String,
}

impl FromRequest for UserAuthData {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<UserAuthData>().cloned().ok_or_else(ApiError::missing_token))
    }
}

/// Rejects requests without a valid bearer token before the handler runs.
#[derive(Clone)]
pub struct AuthMiddleware {
    pub keys: Arc<TokenKeys>,
}

impl AuthMiddleware {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<TokenKeys>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = jwt::parse_request(&req, "Bearer ")
            .and_then(|token| self.keys.verify(&token));
        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(UserAuthData {
                    user_id: claims.user.id,
                    name: claims.user.name,
                });
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(err) => {
                log::debug!("rejected {} {}: {}", req.method(), req.path(), err);
                let response = req.into_response(err.error_response()).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}


pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use uuid::Uuid;

    use crate::{dto::{Claims, ClaimsUser}, errors::ApiError};

    /// Lifetime of an issued token.
    pub const TOKEN_TTL_HOURS: i64 = 24;

    /// HS256 signing material, built once at startup.
    pub struct TokenKeys {
        encoding: EncodingKey,
        decoding: DecodingKey,
        validation: Validation,
        ttl: Duration,
    }

    impl TokenKeys {
        pub fn new(secret: &str) -> Self {
            Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
        }

        pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
            let mut validation = Validation::new(Algorithm::HS256);
            validation.validate_exp = true;
            Self {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
                ttl,
            }
        }

        pub fn issue(&self, user_id: Uuid, name: &str) -> Result<String, ApiError> {
            let now = Utc::now();
            let claims = Claims {
                user: ClaimsUser { id: user_id, name: name.to_string() },
                iat: now.timestamp(),
                exp: (now + self.ttl).timestamp(),
            };
            encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
                log::error!("failed to sign token: {e}");
                ApiError::InternalError
            })
        }

        /// Checks signature and expiry.
        pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
            decode::<Claims>(token, &self.decoding, &self.validation)
                .map(|data| data.claims)
                .map_err(|_| ApiError::invalid_token())
        }
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<String, ApiError> {
        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .ok_or_else(ApiError::missing_token)?;
        let value = header.to_str().map_err(|_| ApiError::invalid_token())?;
        match value.strip_prefix(prefix).map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(ApiError::missing_token()),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn issued_token_verifies() {
            let keys = TokenKeys::new("top-secret");
            let id = Uuid::new_v4();
            let token = keys.issue(id, "Ada").unwrap();
            let claims = keys.verify(&token).unwrap();
            assert_eq!(claims.user.id, id);
            assert_eq!(claims.user.name, "Ada");
            assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
        }

        #[test]
        fn wrong_secret_is_rejected() {
            let token = TokenKeys::new("one").issue(Uuid::new_v4(), "Ada").unwrap();
            assert!(TokenKeys::new("two").verify(&token).is_err());
        }

        #[test]
        fn expired_token_is_rejected() {
            let keys = TokenKeys::with_ttl("top-secret", Duration::hours(-2));
            let token = keys.issue(Uuid::new_v4(), "Ada").unwrap();
            assert!(keys.verify(&token).is_err());
        }
    }
}
