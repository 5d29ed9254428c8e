use serde_json::Value;

/// Authenticated caller, as asserted by the API Gateway authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Reads the caller from `requestContext.authorizer`.
///
/// REST APIs with a Cognito authorizer put the token claims under
/// `authorizer.claims`; HTTP APIs with a JWT authorizer use
/// `authorizer.jwt.claims`. The `sub` claim is required.
pub fn caller_identity(request_context: &Value) -> Option<CallerIdentity> {
    let authorizer = request_context.get("authorizer")?;
    let claims = authorizer
        .get("claims")
        .or_else(|| authorizer.pointer("/jwt/claims"))?;

    let user_id = claims
        .get("sub")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|sub| !sub.is_empty())?;

    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(CallerIdentity {
        user_id: user_id.to_string(),
        email,
    })
}
