// Dashboard UI module
// Uses Askama templates for server-side rendering

mod templates;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::validation::BANK_OPTIONS;
use crate::db::{UserAccount, VehicleType};
use crate::portal::{PortalError, ReportForm, SignupForm, StartParkingForm};
use crate::AppState;

pub use templates::*;

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response(),
    }
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/", get(index))
        .route("/signup", get(signup_page))
        .route("/signup", post(signup_submit))
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/logout", get(logout))
        // Protected routes
        .route("/dashboard", get(dashboard))
        .route("/dashboard/parking", get(parking_details))
        .route("/dashboard/parking", post(start_parking))
        .route("/dashboard/capacity", get(capacity))
        .route("/dashboard/reports", get(report_page))
        .route("/dashboard/reports", post(report_submit))
}

// Session token cookie name
pub const SESSION_COOKIE: &str = "smartpark_session";

// Get token from cookie
fn get_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

fn login_with(flash: Option<Flash>) -> LoginTemplate {
    LoginTemplate {
        flash,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

// Resolve the cookie to an account, or the response to send instead
async fn require_user(jar: &CookieJar, state: &AppState) -> Result<UserAccount, Response> {
    let not_logged_in = || {
        let template = login_with(Some(Flash::from_error(&PortalError::NotLoggedIn)));
        (StatusCode::UNAUTHORIZED, render_template(template)).into_response()
    };

    let token = get_token(jar).ok_or_else(not_logged_in)?;
    match state.portal.authenticate(&token).await {
        Ok(user) => Ok(user),
        Err(PortalError::NotLoggedIn) => Err(not_logged_in()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve session cookie");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response())
        }
    }
}

async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

// Signup page
async fn signup_page() -> Response {
    render_template(SignupTemplate {
        flash: None,
        banks: &BANK_OPTIONS,
    })
}

async fn signup_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Response {
    let flash = match state.portal.signup(&form).await {
        Ok(_) => Flash::success("User registered successfully!"),
        Err(e) => Flash::from_error(&e),
    };
    render_template(SignupTemplate {
        flash: Some(flash),
        banks: &BANK_OPTIONS,
    })
}

// Login page
async fn login_page() -> Response {
    render_template(login_with(None))
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

// Login submit
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.portal.login(&form.email, &form.password).await {
        Ok(outcome) => {
            let jar = jar.add(
                Cookie::build((SESSION_COOKIE, outcome.token.clone()))
                    .path("/")
                    .http_only(true)
                    .secure(state.config.auth.secure_cookies)
                    .same_site(SameSite::Lax)
                    .build(),
            );
            let template = DashboardTemplate {
                user_name: outcome.user.name.clone(),
                flash: Some(Flash::success(outcome.welcome_message())),
                user: outcome.user,
                vehicle_types: VehicleType::ALL,
            };
            (jar, render_template(template)).into_response()
        }
        Err(e) => {
            let status = match e {
                PortalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, render_template(login_with(Some(Flash::from_error(&e))))).into_response()
        }
    }
}

// Logout
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(token) = get_token(&jar) {
        if let Err(e) = state.portal.logout(&token).await {
            tracing::warn!(error = %e, "Failed to revoke login session");
        }
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

// Dashboard home
async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    render_template(DashboardTemplate {
        user_name: user.name.clone(),
        user,
        flash: None,
        vehicle_types: VehicleType::ALL,
    })
}

async fn parking_details(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let (session, flash) = match state.portal.show_details(user.id).await {
        Ok(session) => (Some(session), None),
        Err(e) => (None, Some(Flash::from_error(&e))),
    };

    render_template(ParkingTemplate {
        user_name: user.name,
        flash,
        assignment: None,
        session,
    })
}

async fn start_parking(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<StartParkingForm>,
) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let (assignment, flash) = match state.portal.start_parking(&user, &form).await {
        Ok(assignment) => (Some(assignment), Flash::success("Prediction completed!")),
        Err(e) => (None, Flash::from_error(&e)),
    };

    render_template(ParkingTemplate {
        user_name: user.name,
        flash: Some(flash),
        assignment,
        session: None,
    })
}

async fn capacity(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.portal.check_capacity().await {
        Ok(report) => render_template(CapacityTemplate::new(user.name, &report)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load capacity");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load capacity").into_response()
        }
    }
}

async fn report_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    render_template(ReportTemplate::new(user.name, None))
}

async fn report_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ReportForm>,
) -> Response {
    let user = match require_user(&jar, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let flash = match state.portal.report_issue(user.id, &form).await {
        Ok(_) => Flash::success("Parking report submitted successfully!"),
        Err(e) => Flash::from_error(&e),
    };

    render_template(ReportTemplate::new(user.name, Some(flash)))
}
