//! Navbar and footer content.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use dokan_core::{LocalizedText, NavbarItemId};
use dokan_shared::models::{Footer, FooterLink, NavbarItem, SocialLink};

use crate::error::{AppError, Result};
use crate::middleware::Lang;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NavbarItemView {
    pub id: NavbarItemId,
    pub label: String,
    pub label_i18n: LocalizedText,
    pub url: String,
    pub position: i32,
}

impl NavbarItemView {
    fn new(item: &NavbarItem, lang: dokan_core::Language) -> Self {
        Self {
            id: item.id,
            label: item.label.get(lang).to_string(),
            label_i18n: item.label.clone(),
            url: item.url.clone(),
            position: item.position,
        }
    }
}

/// Footer with the about text resolved; links keep both languages.
#[derive(Debug, Serialize)]
pub struct FooterView {
    pub about: String,
    pub about_i18n: LocalizedText,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub quick_links: Vec<FooterLink>,
    pub social_links: Vec<SocialLink>,
    pub copyright_text: String,
}

impl FooterView {
    fn new(footer: Footer, lang: dokan_core::Language) -> Self {
        Self {
            about: footer.about.get(lang).to_string(),
            about_i18n: footer.about,
            address: footer.address,
            phone: footer.phone,
            email: footer.email,
            quick_links: footer.quick_links,
            social_links: footer.social_links,
            copyright_text: footer.copyright_text,
        }
    }
}

/// Active navbar items in display order.
///
/// # Route
///
/// `GET /api/navbar`
#[instrument(skip(state))]
pub async fn navbar(
    State(state): State<AppState>,
    Lang(lang): Lang,
) -> Result<Json<Vec<NavbarItemView>>> {
    let items = state.content().navbar(state.pool()).await?;
    Ok(Json(
        items.iter().map(|i| NavbarItemView::new(i, lang)).collect(),
    ))
}

/// The site footer.
///
/// # Route
///
/// `GET /api/footer`
#[instrument(skip(state))]
pub async fn footer(State(state): State<AppState>, Lang(lang): Lang) -> Result<Json<FooterView>> {
    let footer = state
        .content()
        .footer(state.pool())
        .await?
        .ok_or_else(|| AppError::NotFound("Footer has not been configured".to_string()))?;

    Ok(Json(FooterView::new(footer, lang)))
}
