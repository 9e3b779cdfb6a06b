//! # gb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core ports.

use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::Utc;
use gb_core::models::{VisitorEntry, VisitorForm};
use gb_core::traits::{EntryJournal, Sanitizer};
use gb_ui::{ConfirmationTemplate, HomeTemplate, CONFIRMATION_REDIRECT_SECONDS};

use crate::error::ApiError;
use crate::extract::ClientSource;

const TITLE: &str = "Guestbook";
pub const CONFIRMATION_PATH: &str = "/confirmation";

/// State shared across all request handlers. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<dyn EntryJournal>,
    pub sanitizer: Arc<dyn Sanitizer>,
    /// Record the client source with each entry
    pub include_source: bool,
    pub images_dir: PathBuf,
}

/// Renders the guestbook form.
pub async fn home() -> Result<Html<String>, ApiError> {
    let html = HomeTemplate { title: TITLE, action: "/" }.render()?;
    Ok(Html(html))
}

/// Sanitizes the submitted form, journals it, and sends the visitor on to
/// the confirmation page.
pub async fn submit(
    State(state): State<AppState>,
    client: ClientSource,
    Form(form): Form<VisitorForm>,
) -> Result<Redirect, ApiError> {
    tracing::debug!(source = %client.descriptor(), "guestbook submission");

    let source = state.include_source.then(|| client.descriptor());
    let entry = VisitorEntry::from_form(form, source, state.sanitizer.as_ref(), Utc::now());

    state.journal.append(&entry).await?;
    tracing::info!(%entry, "guestbook entry saved");

    Ok(Redirect::to(CONFIRMATION_PATH))
}

/// Thank-you page that refreshes back to the form.
pub async fn confirmation() -> Result<Html<String>, ApiError> {
    let html = ConfirmationTemplate {
        title: "Thank you for signing the guestbook",
        home_url: "/",
        redirect_seconds: CONFIRMATION_REDIRECT_SECONDS,
    }
    .render()?;
    Ok(Html(html))
}
