use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse, UsersResponse},
        error::AuthError,
        extractors::AuthUser,
        services::Registration,
    },
    routes::fallback::method_not_allowed,
    state::AppState,
};

pub fn signup_routes() -> Router<AppState> {
    Router::new().route("/signup", post(signup).fallback(method_not_allowed))
}

pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login).fallback(method_not_allowed))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).fallback(method_not_allowed))
        .route("/me", get(get_me).fallback(method_not_allowed))
}

fn bad_body(rejection: JsonRejection) -> AuthError {
    warn!(error = %rejection, "rejected request body");
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AuthError::PayloadTooLarge;
    }
    AuthError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    let Json(body) = payload.map_err(bad_body)?;
    let registration = Registration {
        full_name: body.full_name.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        role: body.role.unwrap_or_default(),
        institution_name: body.institution_name.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
    };

    let user = state.auth.register(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "Registration successful! Please login.",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(body) = payload.map_err(bad_body)?;
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let (user, token) = state.auth.login(&email, &password).await?;
    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful",
        token,
        user,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AuthError> {
    let users = state.auth.list_accounts().await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

#[instrument(skip(state, claims), fields(user_id = claims.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, AuthError> {
    let user = match state.auth.account(claims.user_id).await {
        Ok(u) => u,
        Err(AuthError::NotFound) => {
            warn!("token for unknown account");
            return Err(AuthError::Unauthorized("User not found".into()));
        }
        Err(e) => return Err(e),
    };
    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}
