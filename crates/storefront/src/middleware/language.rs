//! Response language selection.

use axum::extract::FromRequestParts;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;

use dokan_core::Language;

/// The language to resolve bilingual text into.
///
/// Taken from the `lang` query parameter when present, otherwise from the
/// `Accept-Language` header, otherwise English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lang(pub Language);

impl Lang {
    fn from_parts(parts: &Parts) -> Self {
        let from_query = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "lang")
                .map(|(_, value)| Language::from_code(&value))
        });
        if let Some(lang) = from_query {
            return Self(lang);
        }

        let from_header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Language::from_accept_language);
        Self(from_header.unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for Lang
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
