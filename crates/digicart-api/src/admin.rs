//! # Admin Handlers
//!
//! Login/logout, the catalog dashboard and catalog mutation endpoints.
//!
//! The session lives in an `HttpOnly`, `SameSite=Strict` cookie holding a
//! signed session token. [`AdminSession`] turns that cookie into an
//! [`AdminCapability`], which the catalog requires for every edit.

use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use digicart_core::{AdminCapability, ProductPatch, ShopError};
use serde::Deserialize;
use tracing::{info, warn};

/// Cookie carrying the admin session token
pub const SESSION_COOKIE: &str = "digicart_admin";

// =============================================================================
// Session extractor
// =============================================================================

/// A request made with a valid admin session
#[derive(Debug, Clone)]
pub struct AdminSession(pub AdminCapability);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let forbidden = || (StatusCode::FORBIDDEN, "Forbidden").into_response();

        let authority = state.admin.as_ref().ok_or_else(forbidden)?;
        let token = session_cookie(&parts.headers).ok_or_else(forbidden)?;

        authority
            .authorize(&token, state.now())
            .map(AdminSession)
            .map_err(|_| forbidden())
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie_header(state: &AppState, value: &str, max_age_secs: i64) -> String {
    let secure = if state.config.public_url.starts_with("https://") {
        "; Secure"
    } else {
        ""
    };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        SESSION_COOKIE, value, max_age_secs, secure
    )
}

fn see_other(location: &'static str, set_cookie: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, set_cookie),
        ],
    )
        .into_response()
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceForm {
    #[serde(default, alias = "sku", alias = "id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    /// Optional compare-and-swap guard
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductForm {
    #[serde(default, alias = "sku", alias = "id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

type PlainError = (StatusCode, String);

fn parse_price(raw: Option<&str>) -> Result<i64, PlainError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing price".to_string()))?
        .parse::<i64>()
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "Invalid price (integer minor units)".to_string(),
            )
        })
}

fn parse_version(raw: Option<&str>) -> Result<Option<u64>, PlainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => v
            .parse::<u64>()
            .map(Some)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid version".to_string())),
        None => Ok(None),
    }
}

fn catalog_error(err: ShopError) -> PlainError {
    let status = match &err {
        ShopError::UnknownProduct { .. } => StatusCode::NOT_FOUND,
        other => StatusCode::from_u16(other.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    };
    warn!("Catalog edit rejected: {}", err);
    (status, err.to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// Login page
pub async fn login_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>DigiCart Admin</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f4f4f7;">
    <form method="post" action="/admin/login" style="background: white; padding: 40px; border-radius: 12px; display: grid; gap: 12px; min-width: 280px;">
        <h1 style="margin: 0 0 8px;">DigiCart Admin</h1>
        <input name="username" placeholder="Username" autocomplete="username" required>
        <input name="password" type="password" placeholder="Password" autocomplete="current-password" required>
        <button type="submit">Sign in</button>
    </form>
</body>
</html>
"#,
    )
}

/// Check credentials and start a session
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let denied = || (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();

    let Some(authority) = state.admin.as_ref() else {
        warn!("Admin login attempted but admin is not configured");
        return denied();
    };

    match authority.login(&form.username, &form.password, state.now()) {
        Ok(token) => {
            let cookie =
                session_cookie_header(&state, &token, authority.session_ttl().num_seconds());
            see_other("/admin", cookie)
        }
        Err(_) => denied(),
    }
}

/// Clear the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    see_other("/admin/login", session_cookie_header(&state, "", 0))
}

/// Catalog dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
) -> Html<String> {
    let currency = state.config.currency;
    let rows: String = state
        .catalog
        .list_all()
        .iter()
        .map(|p| {
            format!(
                r#"<tr><td><code>{id}</code></td><td>{title}</td><td>{price}</td><td><a href="{url}">{url}</a></td>
<td><form method="post" action="/update-price"><input type="hidden" name="productId" value="{id}"><input type="hidden" name="version" value="{version}"><input name="price" value="{minor}" size="8"> <button>Save</button></form></td></tr>
"#,
                id = escape_html(&p.id),
                title = escape_html(&p.title),
                price = escape_html(&p.display_price(currency)),
                url = escape_html(&p.url),
                version = p.version,
                minor = p.price,
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>DigiCart Admin</title></head>
<body style="font-family: system-ui; margin: 40px;">
    <p>Signed in as <b>{user}</b> · <a href="/admin/logout">Log out</a> · <a href="/catalog">JSON</a></p>
    <h1>Catalog</h1>
    <table cellpadding="6">
        <tr><th>ID</th><th>Title</th><th>Price</th><th>Resource</th><th>Price ({currency}, minor units)</th></tr>
{rows}    </table>
    <h2>Add product</h2>
    <form method="post" action="/add-product" style="display: grid; gap: 8px; max-width: 420px;">
        <input name="productId" placeholder="ID (optional)">
        <input name="title" placeholder="Title" required>
        <input name="price" placeholder="Price in minor units" required>
        <input name="url" placeholder="https://..." required>
        <button type="submit">Add</button>
    </form>
</body>
</html>
"#,
        user = escape_html(admin.username()),
        currency = currency,
        rows = rows,
    ))
}

/// Full catalog, including resource locators
pub async fn catalog(State(state): State<AppState>, _admin: AdminSession) -> impl IntoResponse {
    let products = state.catalog.list_all();
    Json(serde_json::json!({
        "products": products,
        "count": products.len(),
        "currency": state.config.currency,
    }))
}

/// Update one product's price in place
pub async fn update_price(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Form(form): Form<UpdatePriceForm>,
) -> Result<&'static str, PlainError> {
    let product_id = form
        .product_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing productId".to_string()))?;
    let price = parse_price(form.price.as_deref())?;
    let version = parse_version(form.version.as_deref())?;

    let product = state
        .catalog
        .upsert(&admin, Some(&product_id), ProductPatch::price(price), version)
        .map_err(catalog_error)?;

    info!(product_id = %product.id, price = product.price, "Price updated");
    Ok("OK")
}

/// Add a product (generated ID unless one is given)
pub async fn add_product(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Form(form): Form<AddProductForm>,
) -> Result<String, PlainError> {
    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing title".to_string()))?;
    let url = form
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing url".to_string()))?;
    let price = parse_price(form.price.as_deref())?;

    let product = state
        .catalog
        .upsert(
            &admin,
            form.product_id.as_deref(),
            ProductPatch::full(title.trim(), price, url.trim()),
            None,
        )
        .map_err(catalog_error)?;

    Ok(format!("OK {}", product.id))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; digicart_admin=abc.def.ghi; other=1"),
        );
        assert_eq!(session_cookie(&headers), Some("abc.def.ghi".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("digicart_admin="));
        assert_eq!(session_cookie(&headers), None);

        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some(" 24900 ")), Ok(24900));
        assert!(parse_price(Some("249.00")).is_err());
        assert!(parse_price(Some("")).is_err());
        assert!(parse_price(None).is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(Some("3")), Ok(Some(3)));
        assert_eq!(parse_version(Some("")), Ok(None));
        assert!(parse_version(Some("x")).is_err());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script>&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#x27;"
        );
    }
}
