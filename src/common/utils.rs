use lambda_http::http::StatusCode;
use lambda_http::{Request, RequestPayloadExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::common::errors::{Error, NoteStoreError};

const EMPTY_PAYLOAD_ERROR: &str = "Request payload is empty";

/// Parses the request body by its content type. Bodies sent without a
/// content type are read as JSON.
pub fn extract_request<T: DeserializeOwned>(request: Request) -> Result<T, Error> {
    let payload = match request.payload::<T>() {
        Ok(None) if !request.body().is_empty() => serde_json::from_slice::<T>(request.body())
            .map(Some)
            .map_err(|err| err.to_string()),
        result => result.map_err(|err| err.to_string()),
    };

    match payload {
        Ok(Some(val)) => Ok(val),
        Ok(None) => Err(Error::HttpError(message_response(
            StatusCode::BAD_REQUEST,
            "InvalidInput",
            EMPTY_PAYLOAD_ERROR,
        )?)),
        Err(err) => Err(Error::HttpError(message_response(
            StatusCode::BAD_REQUEST,
            "InvalidInput",
            &err,
        )?)),
    }
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<String>, Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_string(body)?)?;

    Ok(response)
}

pub fn empty_response(status: StatusCode) -> Result<Response<String>, Error> {
    let response = Response::builder()
        .status(status)
        .body(Default::default())?;

    Ok(response)
}

fn message_response(
    status: StatusCode,
    kind: &str,
    message: &str,
) -> Result<Response<String>, Error> {
    json_response(status, &json!({ "error": kind, "message": message }))
}

pub fn status_for(err: &NoteStoreError) -> StatusCode {
    match err {
        NoteStoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        NoteStoreError::NotFound(_) => StatusCode::NOT_FOUND,
        NoteStoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Turns a store failure into the response the caller receives.
pub fn store_error(err: NoteStoreError) -> Error {
    match message_response(status_for(&err), err.kind(), &err.to_string()) {
        Ok(response) => Error::HttpError(response),
        Err(err) => err,
    }
}
