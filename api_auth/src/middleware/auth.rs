use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    Error, HttpMessage,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::AUTHORIZATION,
    web,
};
use common::{error::AppError, jwt};
use futures::future::{Ready, ok};

use crate::services::auth::AuthService;

pub const MISSING_TOKEN: &str = "No authorization token provided";

/// Guards the wrapped routes with a bearer token.
///
/// On success the resolved `db::models::user::User` is stored in the request
/// extensions, handlers read it with `web::ReqData<User>`. Requires
/// `web::Data<AuthService>` to be registered as app data.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(jwt::bearer_token)
            .map(str::to_string);
        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        let srv = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = match (auth, token) {
                (None, _) => Err(AppError::Internal(
                    "AuthService is not registered as app data".to_string(),
                )),
                (_, None) => Err(AppError::Unauthorized(MISSING_TOKEN.to_string())),
                (Some(auth), Some(token)) => auth.authenticate(&token).await,
            };

            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(err) => Ok(req.into_response(err.to_http_response())),
            }
        })
    }
}
