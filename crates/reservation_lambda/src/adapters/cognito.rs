use aws_sdk_cognitoidentityprovider::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType, MessageActionType};
use aws_sdk_cognitoidentityprovider::Client;
use reservation_core::contract::{Credentials, NewUser};

use super::run_blocking;
use super::user_directory::{DirectoryError, UserDirectory};

/// Cognito user pool used through its admin API, so no confirmation code
/// round-trip is needed.
#[derive(Clone)]
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoDirectory {
    pub fn new(
        client: Client,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
        }
    }
}

impl UserDirectory for CognitoDirectory {
    fn sign_up(&self, user: &NewUser) -> Result<(), DirectoryError> {
        let attributes = [
            ("email", user.email.as_str()),
            ("email_verified", "true"),
            ("given_name", user.first_name.as_str()),
            ("family_name", user.last_name.as_str()),
        ]
        .into_iter()
        .map(|(name, value)| {
            AttributeType::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|error| {
                    DirectoryError::Unavailable(format!("invalid user attribute: {error}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

        run_blocking(async {
            self.client
                .admin_create_user()
                .user_pool_id(&self.user_pool_id)
                .username(&user.email)
                .set_user_attributes(Some(attributes))
                .message_action(MessageActionType::Suppress)
                .send()
                .await
                .map_err(|error| {
                    if error
                        .as_service_error()
                        .is_some_and(|service| service.is_username_exists_exception())
                    {
                        DirectoryError::UserExists
                    } else {
                        DirectoryError::Unavailable(format!(
                            "failed to create user: {}",
                            DisplayErrorContext(&error)
                        ))
                    }
                })?;

            self.client
                .admin_set_user_password()
                .user_pool_id(&self.user_pool_id)
                .username(&user.email)
                .password(&user.password)
                .permanent(true)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    DirectoryError::Unavailable(format!(
                        "failed to set user password: {}",
                        DisplayErrorContext(&error)
                    ))
                })
        })
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<String, DirectoryError> {
        let output = run_blocking(
            self.client
                .admin_initiate_auth()
                .user_pool_id(&self.user_pool_id)
                .client_id(&self.client_id)
                .auth_flow(AuthFlowType::AdminUserPasswordAuth)
                .auth_parameters("USERNAME", &credentials.email)
                .auth_parameters("PASSWORD", &credentials.password)
                .send(),
        )
        .map_err(|error| match error.as_service_error() {
            Some(service)
                if service.is_not_authorized_exception()
                    || service.is_user_not_found_exception() =>
            {
                DirectoryError::InvalidCredentials
            }
            _ => DirectoryError::Unavailable(format!(
                "failed to authenticate user: {}",
                DisplayErrorContext(&error)
            )),
        })?;

        output
            .authentication_result()
            .and_then(|result| result.id_token())
            .map(str::to_string)
            .ok_or_else(|| {
                DirectoryError::Unavailable("authentication returned no id token".to_string())
            })
    }
}
