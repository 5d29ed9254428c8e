use lambda_runtime::{service_fn, Error, LambdaEvent};
use reservation_lambda::handlers::messages::{handle_sns_event, MessageBatchResponse};
use reservation_lambda::telemetry;
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<MessageBatchResponse, Error> {
    handle_sns_event(event.payload).map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    lambda_runtime::run(service_fn(handle_request)).await
}
