use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::warn;

use super::csrf::CsrfToken;
use super::domain::CheckInResult;
use super::form::{validate_dni, CheckInForm, CheckInRequest};
use super::processor::CheckInProcessor;
use super::view::{render_page, KioskPage};
use crate::config::KioskConfig;
use crate::error::AppError;
use crate::workflows::membership::MembershipApi;

/// Shared state for the kiosk handlers.
pub struct KioskState<A> {
    pub processor: Arc<CheckInProcessor<A>>,
    pub kiosk: KioskConfig,
}

impl<A> Clone for KioskState<A> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            kiosk: self.kiosk,
        }
    }
}

/// Kiosk page plus the JSON check-in endpoint.
pub fn checkin_router<A>(processor: Arc<CheckInProcessor<A>>, kiosk: KioskConfig) -> Router
where
    A: MembershipApi + 'static,
{
    Router::new()
        .route("/", get(kiosk_page::<A>).post(submit_handler::<A>))
        .route("/api/v1/check-ins", post(check_in_handler::<A>))
        .with_state(KioskState { processor, kiosk })
}

pub(crate) async fn kiosk_page<A>(State(state): State<KioskState<A>>) -> Response
where
    A: MembershipApi + 'static,
{
    let token = CsrfToken::generate();
    let html = render_page(&KioskPage {
        result: &CheckInResult::idle(),
        dni: "",
        dni_error: None,
        csrf_token: token.as_str(),
        reload_after_secs: state.kiosk.reload_after_secs,
    });
    html_response(StatusCode::OK, html, Some(&token))
}

pub(crate) async fn submit_handler<A>(
    State(state): State<KioskState<A>>,
    headers: HeaderMap,
    Form(form): Form<CheckInForm>,
) -> Response
where
    A: MembershipApi + 'static,
{
    let token = match CsrfToken::verify(&headers, &form.csrf_token) {
        Ok(token) => token,
        Err(error) => {
            warn!(%error, "rejected kiosk submission");
            return html_response(
                StatusCode::FORBIDDEN,
                format!("<!doctype html><html><body><h1>403 Forbidden</h1><p>{error}</p></body></html>"),
                None,
            );
        }
    };

    let (result, dni_error) = match validate_dni(&form.dni) {
        Ok(dni) => (state.processor.process(&dni).await, None),
        Err(error) => (CheckInResult::idle(), Some(error.to_string())),
    };

    let html = render_page(&KioskPage {
        result: &result,
        dni: if dni_error.is_some() { &form.dni } else { "" },
        dni_error,
        csrf_token: token.as_str(),
        reload_after_secs: state.kiosk.reload_after_secs,
    });
    html_response(StatusCode::OK, html, None)
}

pub(crate) async fn check_in_handler<A>(
    State(state): State<KioskState<A>>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResult>, AppError>
where
    A: MembershipApi + 'static,
{
    let dni = validate_dni(&request.dni)?;
    Ok(Json(state.processor.process(&dni).await))
}

fn html_response(status: StatusCode, html: String, token: Option<&CsrfToken>) -> Response {
    let mut response = (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response();

    if let Some(cookie) = token.and_then(CsrfToken::set_cookie) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}
