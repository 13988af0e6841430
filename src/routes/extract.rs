//! Body and query string extractors that reject with the crate [Error], so
//! unreadable input gets the same JSON error body as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// A JSON body. Malformed JSON or fields of the wrong type are a
/// [crate::ValidationError].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub(crate) struct ApiJson<T>(pub(crate) T);

/// A query string. Missing or malformed parameters are a
/// [crate::ValidationError].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub(crate) struct ApiQuery<T>(pub(crate) T);

/// Path parameters, e.g. a non-numeric expense ID is a
/// [crate::ValidationError].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub(crate) struct ApiPath<T>(pub(crate) T);
