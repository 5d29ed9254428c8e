use lambda_runtime::{service_fn, Error, LambdaEvent};
use reservation_lambda::adapters::cognito::CognitoDirectory;
use reservation_lambda::adapters::dynamodb::{DynamoReservationStore, DynamoTableStore};
use reservation_lambda::config::ApiConfig;
use reservation_lambda::handlers::api::{handle_api_event, ApiDependencies};
use reservation_lambda::handlers::http::ApiGatewayResponse;
use reservation_lambda::telemetry;
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = ApiConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dynamodb = aws_sdk_dynamodb::Client::new(&aws_config);

    let tables = DynamoTableStore::new(
        dynamodb.clone(),
        &config.tables_table,
        &config.slot_ledger_table,
    );
    let reservations = DynamoReservationStore::new(
        dynamodb,
        &config.reservations_table,
        &config.slot_ledger_table,
    );
    let directory = CognitoDirectory::new(
        aws_sdk_cognitoidentityprovider::Client::new(&aws_config),
        &config.user_pool_id,
        &config.user_pool_client_id,
    );
    let deps = ApiDependencies {
        tables: &tables,
        reservations: &reservations,
        directory: &directory,
    };

    info!(
        component = "reservations_api",
        event = "cold_start",
        tables_table = %config.tables_table,
        reservations_table = %config.reservations_table,
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<ApiGatewayResponse, Error>(handle_api_event(event.payload, deps))
    }))
    .await
}
