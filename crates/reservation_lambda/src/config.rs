use thiserror::Error;

pub const TABLES_TABLE_VAR: &str = "TABLES_TABLE";
pub const RESERVATIONS_TABLE_VAR: &str = "RESERVATIONS_TABLE";
pub const SLOT_LEDGER_TABLE_VAR: &str = "SLOT_LEDGER_TABLE";
pub const USER_POOL_ID_VAR: &str = "COGNITO_USER_POOL_ID";
pub const USER_POOL_CLIENT_ID_VAR: &str = "COGNITO_CLIENT_ID";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} must be configured")]
pub struct ConfigError(pub &'static str);

/// Cold-start configuration of the reservations API function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub tables_table: String,
    pub reservations_table: String,
    pub slot_ledger_table: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError(name))
        };

        Ok(Self {
            tables_table: required(TABLES_TABLE_VAR)?,
            reservations_table: required(RESERVATIONS_TABLE_VAR)?,
            slot_ledger_table: required(SLOT_LEDGER_TABLE_VAR)?,
            user_pool_id: required(USER_POOL_ID_VAR)?,
            user_pool_client_id: required(USER_POOL_CLIENT_ID_VAR)?,
        })
    }
}
