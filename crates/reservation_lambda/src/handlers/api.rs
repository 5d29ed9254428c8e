use reservation_core::error::ApiError;
use reservation_core::identity::caller_identity;
use reservation_core::route::Route;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::adapters::reservation_store::ReservationStore;
use crate::adapters::table_store::TableStore;
use crate::adapters::user_directory::UserDirectory;
use crate::handlers::http::{
    error_response, normalize_http_event, success_response, ApiGatewayResponse, HttpRequest,
};
use crate::handlers::{auth, booking, tables};

/// Backend handles the API function was started with.
#[derive(Clone, Copy)]
pub struct ApiDependencies<'a> {
    pub tables: &'a dyn TableStore,
    pub reservations: &'a dyn ReservationStore,
    pub directory: &'a dyn UserDirectory,
}

pub fn handle_api_event(event: Value, deps: ApiDependencies<'_>) -> ApiGatewayResponse {
    let request = match normalize_http_event(event) {
        Ok(value) => value,
        Err(message) => return error_response(&ApiError::Validation(message)),
    };

    match dispatch(&request, deps) {
        Ok(response) => {
            info!(
                component = "api",
                event = "request_completed",
                method = %request.method,
                path = %request.path,
                status_code = response.status_code,
            );
            response
        }
        Err(failure) => {
            log_failure(&request, &failure);
            error_response(&failure)
        }
    }
}

fn dispatch(
    request: &HttpRequest,
    deps: ApiDependencies<'_>,
) -> Result<ApiGatewayResponse, ApiError> {
    let route = Route::resolve(&request.method, &request.path).ok_or_else(|| {
        ApiError::UnsupportedRoute {
            method: request.method.clone(),
            path: request.path.clone(),
        }
    })?;

    debug!(component = "api", event = "route_resolved", route = route.name());

    let caller = caller_identity(&request.request_context);
    if route.requires_identity() && caller.is_none() {
        return Err(ApiError::Unauthorized);
    }

    match route {
        Route::SignUp => auth::sign_up(request.json_body()?, deps.directory)
            .map(|body| success_response(200, body)),
        Route::SignIn => auth::sign_in(request.json_body()?, deps.directory)
            .map(|body| success_response(200, body)),
        Route::ListTables => {
            tables::list_tables(deps.tables).map(|body| success_response(200, body))
        }
        Route::CreateTable => tables::create_table(request.json_body()?, deps.tables)
            .map(|body| success_response(200, body)),
        Route::GetTable { table_id } => {
            tables::get_table(&table_id, deps.tables).map(|body| success_response(200, body))
        }
        Route::CreateReservation => {
            let caller = caller.ok_or(ApiError::Unauthorized)?;
            booking::create_reservation(
                request.json_body()?,
                &caller,
                deps.tables,
                deps.reservations,
            )
            .map(|body| success_response(200, body))
        }
        Route::ListReservations => {
            let caller = caller.ok_or(ApiError::Unauthorized)?;
            booking::list_reservations(&caller, deps.reservations)
                .map(|body| success_response(200, body))
        }
    }
}

fn log_failure(request: &HttpRequest, failure: &ApiError) {
    if let ApiError::BackendUnavailable(detail) = failure {
        error!(
            component = "api",
            event = "request_failed",
            method = %request.method,
            path = %request.path,
            error_kind = failure.kind(),
            detail = %detail,
        );
    } else {
        warn!(
            component = "api",
            event = "request_rejected",
            method = %request.method,
            path = %request.path,
            error_kind = failure.kind(),
            status_code = failure.status_code(),
        );
    }
}
