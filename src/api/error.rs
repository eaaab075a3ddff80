use actix_web::{
    FromRequest,
    HttpRequest,
    HttpResponse,
    Responder,
    dev::{AsyncResult, Route},
    http::StatusCode,
};
use failure::Fail;
use log::error;
use sentry::{Hub, integrations::failure::event_from_fail};
use sentry_actix::ActixWebHubExt;
use serde::Serialize;
use std::borrow::Cow;

/// An error that occurred while handling an API request.
pub trait ApiError: Fail {
    /// HTTP response status code.
    fn status(&self) -> StatusCode;

    /// Internal code describing this error.
    ///
    /// This code is used to identify this error outside the system, and thus
    /// should only be present for errors which are intended to be reported
    /// to the user in detail.
    fn code(&self) -> Option<Cow<str>>;
}

/// A wrapper around any [`ApiError`], so that handlers can fail with
/// different error types.
#[derive(Debug, Fail)]
#[fail(display = "{}", _0)]
pub struct Error(Box<dyn ApiError>);

impl<T: ApiError> From<T> for Error {
    fn from(error: T) -> Error {
        Error(Box::new(error))
    }
}

#[derive(Debug)]
enum ApiResult<R> {
    Response(R),
    Error(Error),
}

impl<R: Responder> Responder for ApiResult<R> {
    type Item = AsyncResult<HttpResponse>;
    type Error = actix_web::error::Error;

    fn respond_to<S: 'static>(self, req: &HttpRequest<S>)
    -> Result<Self::Item, <Self as Responder>::Error> {
        let err = match self {
            ApiResult::Response(r) => return r.respond_to(req)
                .map(Into::into)
                .map_err(Into::into),
            ApiResult::Error(e) => e,
        };

        capture_error(req, &err);
        let Error(err) = err;

        Ok(AsyncResult::ok(match err.code() {
            Some(code) => HttpResponse::build(err.status())
                .json(ErrorResponse {
                    error: &code,
                    raw: err.to_string(),
                }),
            None => {
                error!("{}", err);
                HttpResponse::new(err.status())
            }
        }))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'s> {
    error: &'s str,
    raw: String,
}

/// An alternative version of Actix's request handler, that may fail with
/// [`ApiError`]s instead of Actix's [`actix_web::error::Error`].
///
/// To mount an `ApiHandler` use [`RouteExt::api_with()`].
pub trait ApiHandler<Args: FromRequest<S>, S> {
    type Response: Responder;
    type Error: Into<Error>;

    fn handle(&self, args: Args) -> Result<Self::Response, Self::Error>;
}

macro_rules! impl_api_handler {
    {
        $(
            $($name:ident : $type:ident),*;
        )*
    } => {
        $(
            impl<Func, State, Res, Err $(, $type)*> ApiHandler<($($type,)*), State> for Func
            where
                Func: Fn($($type),*) -> Result<Res, Err>,
                ($($type,)*): FromRequest<State>,
                Res: Responder,
                Err: Into<Error>,
            {
                type Response = Res;
                type Error = Err;

                fn handle(&self, ($($name,)*): ($($type,)*))
                -> Result<Res, Err> {
                    self($($name),*)
                }
            }
        )*
    }
}

impl_api_handler! {
    a: A;
    a: A, b: B;
    a: A, b: B, c: C;
    a: A, b: B, c: C, d: D;
}

/// This trait extends [`actix_web::dev::Route`] with support
/// for [`ApiHandler`].
pub trait RouteExt<S> {
    fn api_with<T, H>(&mut self, handler: H)
    where
        T: FromRequest<S> + 'static,
        H: ApiHandler<T, S> + 'static;
}

impl<S: 'static> RouteExt<S> for Route<S> {
    fn api_with<T, H>(&mut self, handler: H)
    where
        T: FromRequest<S> + 'static,
        H: ApiHandler<T, S> + 'static,
    {
        self.with(build_handler(handler))
    }
}

/// Turn an [`ApiHandler`] into an Actix handler.
fn build_handler<S, T, H>(handler: H)
    -> impl Fn(T) -> ApiResult<H::Response>
where
    T: FromRequest<S>,
    H: ApiHandler<T, S>,
{
    move |args| match handler.handle(args) {
        Ok(rsp) => ApiResult::Response(rsp),
        Err(err) => ApiResult::Error(err.into()),
    }
}

/// Capture an error and report it to Sentry.io.
fn capture_error<S>(req: &HttpRequest<S>, error: &Error) {
    Hub::from_request(req)
        .capture_event(event_from_fail(error));
}
