//! Page payloads, redirects and one-time flash messages.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::CurrentUser;

pub const FLASH_COOKIE: &str = "inkwell_flash";

/// Status text shown once after a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.error.is_none()
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Read the flash cookie from request headers, if one was set.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == FLASH_COOKIE)
            .and_then(|cookie| Self::decode(cookie.value()))
    }

    fn set_cookie(&self) -> String {
        Cookie::build((FLASH_COOKIE, self.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
            .to_string()
    }

    fn clear_cookie() -> String {
        let mut cookie = Cookie::build((FLASH_COOKIE, "")).path("/").build();
        cookie.make_removal();
        cookie.to_string()
    }
}

/// Per-request state handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub path: String,
    pub url: String,
    pub referer: Option<String>,
}

impl RequestContext {
    /// Where a "go back" redirect should land: the referring path, or
    /// `fallback` when there is none.
    pub fn back_or(&self, fallback: &str) -> String {
        self.referer
            .as_deref()
            .and_then(local_path)
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn local_path(referer: &str) -> Option<String> {
    if referer.starts_with('/') && !referer.starts_with("//") {
        return Some(referer.to_string());
    }
    let parsed = url::Url::parse(referer).ok()?;
    Some(match parsed.query() {
        Some(query) => format!("{}?{}", parsed.path(), query),
        None => parsed.path().to_string(),
    })
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(Self {
            user: parts.extensions.get::<CurrentUser>().cloned(),
            flash: Flash::from_headers(&parts.headers),
            path: parts.uri.path().to_string(),
            url,
            referer: parts
                .headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

/// A rendered page: view component name plus its props.
#[derive(Debug, Clone)]
pub struct Page {
    component: &'static str,
    props: Value,
    url: String,
    user: Option<CurrentUser>,
    flash: Option<Flash>,
}

impl Page {
    pub fn render(component: &'static str, props: Value, ctx: &RequestContext) -> Self {
        Self {
            component,
            props,
            url: ctx.url.clone(),
            user: ctx.user.clone(),
            flash: ctx.flash.clone(),
        }
    }

    /// Page object with shared props merged in.
    pub fn to_json(&self) -> Value {
        let mut props = match &self.props {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
        };

        let flash = self.flash.clone().unwrap_or_default();
        props.insert("auth".to_string(), json!({ "user": self.user }));
        props.insert(
            "flash".to_string(),
            json!({ "message": flash.message, "error": flash.error }),
        );

        json!({
            "component": self.component,
            "props": props,
            "url": self.url,
        })
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut response = Json(self.to_json()).into_response();
        if self.flash.is_some() {
            if let Ok(value) = HeaderValue::from_str(&Flash::clear_cookie()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

/// 303 redirect, optionally carrying a flash message.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
    flash: Option<Flash>,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: None,
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.flash = Some(Flash::message(text));
        self
    }

    pub fn with_error(mut self, text: impl Into<String>) -> Self {
        self.flash = Some(Flash::error(text));
        self
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        let headers = response.headers_mut();

        match HeaderValue::from_str(&self.location) {
            Ok(location) => {
                headers.insert(header::LOCATION, location);
            }
            Err(_) => {
                tracing::error!(location = %self.location, "unrepresentable redirect target");
                headers.insert(header::LOCATION, HeaderValue::from_static("/"));
            }
        }

        if let Some(flash) = self.flash.filter(|f| !f.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&flash.set_cookie()) {
                headers.append(header::SET_COOKIE, value);
            }
        }

        response
    }
}
