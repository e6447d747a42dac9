use lambda_http::http::StatusCode;
use lambda_http::{
    run, service_fn, Error as LambdaError, Request as LambdaRequest, Response as LambdaResponse,
};
use tracing::info;

use notes_lambdas::common::dynamo::{load_client, DynamoNoteTable};
use notes_lambdas::common::errors::Error;
use notes_lambdas::common::note_store::{NoteStore, NoteTable};
use notes_lambdas::common::utils::{json_response, store_error};
use notes_lambdas::common::{init_tracing, table_name};

// The request carries nothing the listing depends on.
#[tracing::instrument(skip_all)]
async fn process_request<T: NoteTable>(
    _request: LambdaRequest,
    store: &NoteStore<T>,
) -> Result<LambdaResponse<String>, Error> {
    let notes = store.list().await.map_err(store_error)?;
    info!("Returning {} notes", notes.len());

    json_response(StatusCode::OK, &notes)
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
