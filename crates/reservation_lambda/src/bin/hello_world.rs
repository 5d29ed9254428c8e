use lambda_runtime::{service_fn, Error, LambdaEvent};
use reservation_lambda::handlers::hello::handle_hello_event;
use reservation_lambda::handlers::http::ApiGatewayResponse;
use reservation_lambda::telemetry;
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_hello_event(event.payload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    lambda_runtime::run(service_fn(handle_request)).await
}
