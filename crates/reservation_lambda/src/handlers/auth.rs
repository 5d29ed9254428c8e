use reservation_core::contract::{
    normalize_sign_in, normalize_sign_up, MessageResponse, SignInRequest, SignInResponse,
    SignUpRequest, USER_CREATED_MESSAGE,
};
use reservation_core::error::ApiError;
use tracing::info;

use crate::adapters::user_directory::UserDirectory;

pub fn sign_up(
    request: SignUpRequest,
    directory: &dyn UserDirectory,
) -> Result<MessageResponse, ApiError> {
    let user = normalize_sign_up(request)?;
    directory.sign_up(&user)?;
    info!(component = "auth", event = "user_signed_up");
    Ok(MessageResponse::new(USER_CREATED_MESSAGE))
}

pub fn sign_in(
    request: SignInRequest,
    directory: &dyn UserDirectory,
) -> Result<SignInResponse, ApiError> {
    let credentials = normalize_sign_in(request)?;
    let access_token = directory.sign_in(&credentials)?;
    Ok(SignInResponse { access_token })
}
