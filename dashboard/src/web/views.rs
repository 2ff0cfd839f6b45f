use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::Serialize;
use uuid::Uuid;

use super::{
    ApiErr, AppState,
    forms::{FormErrors, LoginForm, LoginFormEcho},
    routes,
    session::{
        CollegeAdminRole, FlashMessage, LoginRequired, ProfessorRole, RoleGuard, RoleRequired,
        SignedIn, StudentRole, Visitor,
    },
};
use crate::entity::user::{self, UserType};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";
pub const LOGGED_OUT: &str = "You have been logged out successfully.";

// ---------- page payloads ----------

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub form: LoginFormEcho,
    pub errors: FormErrors,
    pub messages: Vec<FlashMessage>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub user_type: UserType,
    pub college_id: Option<Uuid>,
}

impl From<&user::Model> for UserSummary {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name(),
            user_type: u.user_type,
            college_id: u.college_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub message: String,
    pub user: UserSummary,
    pub messages: Vec<FlashMessage>,
}

fn to_dashboard(user: &user::Model) -> Response {
    Redirect::to(user.user_type.dashboard_route()).into_response()
}

fn with_session_cookie(
    state: &AppState,
    token: &str,
    response: Response,
) -> Result<Response, ApiErr> {
    let cookie = state.sessions.set_cookie(token).map_err(ApiErr::internal)?;
    Ok(([(header::SET_COOKIE, cookie)], response).into_response())
}

// ---------- login / logout ----------

pub async fn login_page(State(state): State<AppState>, visitor: Visitor) -> Response {
    if let Some(ref user) = visitor.user {
        return to_dashboard(user);
    }

    let messages = visitor
        .session_id
        .map(|sid| state.sessions.take_messages(sid))
        .unwrap_or_default();

    Json(LoginPage {
        form: LoginFormEcho::default(),
        errors: FormErrors::default(),
        messages,
    })
    .into_response()
}

pub async fn login_submit(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiErr> {
    if let Some(ref user) = visitor.user {
        return Ok(to_dashboard(user));
    }

    let pending = |state: &AppState| {
        visitor
            .session_id
            .map(|sid| state.sessions.take_messages(sid))
            .unwrap_or_default()
    };

    let credentials = match form.clean() {
        Ok(c) => c,
        Err(errors) => {
            return Ok(Json(LoginPage {
                form: form.echo(),
                errors,
                messages: pending(&state),
            })
            .into_response());
        }
    };

    let user = match state
        .auth
        .authenticate(&credentials.username, &credentials.password)
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_rejection() => {
            tracing::warn!(username = %credentials.username, "login failed");
            let mut messages = pending(&state);
            messages.push(FlashMessage::error(INVALID_CREDENTIALS));
            return Ok(Json(LoginPage {
                form: form.echo(),
                errors: FormErrors::default(),
                messages,
            })
            .into_response());
        }
        Err(e) => return Err(ApiErr::internal(e)),
    };

    // Fresh session id on login; anything queued on the old one carries over.
    let mut messages = visitor
        .session_id
        .map(|sid| state.sessions.destroy(sid))
        .unwrap_or_default();
    messages.push(FlashMessage::success(format!("Welcome, {}!", user.username)));

    let issued = state
        .sessions
        .issue(Some(user.id), messages)
        .map_err(ApiErr::internal)?;

    tracing::info!(username = %user.username, role = %user.user_type, "login succeeded");

    with_session_cookie(&state, &issued.token, to_dashboard(&user))
}

pub async fn logout(
    State(state): State<AppState>,
    LoginRequired(signed_in): LoginRequired,
) -> Result<Response, ApiErr> {
    state.sessions.destroy(signed_in.session_id);
    let issued = state
        .sessions
        .issue(None, vec![FlashMessage::success(LOGGED_OUT)])
        .map_err(ApiErr::internal)?;

    tracing::info!(username = %signed_in.user.username, "logged out");

    with_session_cookie(
        &state,
        &issued.token,
        Redirect::to(routes::LOGIN).into_response(),
    )
}

// ---------- dashboards ----------

fn dashboard<R: RoleGuard>(state: &AppState, signed_in: SignedIn) -> Json<DashboardPage> {
    Json(DashboardPage {
        message: format!("Welcome to the {} Dashboard!", R::ROLE.label()),
        user: UserSummary::from(&signed_in.user),
        messages: state.sessions.take_messages(signed_in.session_id),
    })
}

pub async fn professor_dashboard(
    State(state): State<AppState>,
    guard: RoleRequired<ProfessorRole>,
) -> Json<DashboardPage> {
    dashboard::<ProfessorRole>(&state, guard.signed_in)
}

pub async fn student_dashboard(
    State(state): State<AppState>,
    guard: RoleRequired<StudentRole>,
) -> Json<DashboardPage> {
    dashboard::<StudentRole>(&state, guard.signed_in)
}

pub async fn college_admin_dashboard(
    State(state): State<AppState>,
    guard: RoleRequired<CollegeAdminRole>,
) -> Json<DashboardPage> {
    dashboard::<CollegeAdminRole>(&state, guard.signed_in)
}
