use lambda_http::http::StatusCode;
use lambda_http::{
    run, service_fn, Error as LambdaError, Request as LambdaRequest, Response as LambdaResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use notes_lambdas::common::dynamo::{load_client, DynamoNoteTable};
use notes_lambdas::common::errors::Error;
use notes_lambdas::common::note_store::{NoteStore, NoteTable};
use notes_lambdas::common::utils::{extract_request, json_response, store_error};
use notes_lambdas::common::{init_tracing, table_name};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    pub content: Option<Value>,
}

#[tracing::instrument(skip_all)]
async fn process_request<T: NoteTable>(
    request: LambdaRequest,
    store: &NoteStore<T>,
) -> Result<LambdaResponse<String>, Error> {
    let request = extract_request::<Request>(request)?;

    let note = store.create(request.content).await.map_err(store_error)?;
    info!("Created note {}", note.id);

    json_response(StatusCode::CREATED, &note)
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let dynamo_client = load_client().await;
    let store = NoteStore::new(DynamoNoteTable::new(dynamo_client, table_name()));

    let store = &store;
    run(service_fn(move |request: LambdaRequest| async move {
        match process_request(request, store).await {
            Ok(val) => Ok(val),
            Err(Error::HttpError(val)) => Ok(val),
            Err(Error::LambdaError(err)) => Err(err),
        }
    }))
    .await
}
