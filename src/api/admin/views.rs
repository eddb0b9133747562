//! Server-rendered admin pages.
//!
//! Every interpolated value goes through [`esc`] or [`attr`].

use axum::response::{Html, Redirect};
use serde::Deserialize;

use crate::db::{ApiKey, ImageFile};
use crate::services::{AdminIdentity, ApiKeyUsage, CatalogueSummary, RuntimeSettings};

/// `?success=` / `?error=` messages carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Images,
    ApiKeys,
    Settings,
}

pub fn redirect_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?success={}", urlencoding::encode(message)))
}

pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={}", urlencoding::encode(message)))
}

fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

#[must_use]
pub fn format_file_size(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / div as f64;
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp.min(5)];
    format!("{value:.1} {prefix}B")
}

/// RFC 3339 timestamps rendered as e.g. `Jan 2, 2026 3:04 PM`.
#[must_use]
pub fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts).map_or_else(
        |_| ts.to_string(),
        |dt| dt.format("%b %-d, %Y %-I:%M %p").to_string(),
    )
}

#[must_use]
pub fn format_date(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map_or_else(|_| ts.to_string(), |dt| dt.format("%b %-d, %Y").to_string())
}

fn flash_html(flash: &Flash) -> String {
    let mut out = String::new();
    if let Some(msg) = flash.success.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(&format!(r#"<div class="flash success">{}</div>"#, esc(msg)));
    }
    if let Some(msg) = flash.error.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(&format!(r#"<div class="flash error">{}</div>"#, esc(msg)));
    }
    out
}

fn nav_html(user: &AdminIdentity, active: Nav) -> String {
    let link = |href: &str, label: &str, nav: Nav| {
        let class = if nav == active { r#" class="active""# } else { "" };
        format!(r#"<a href="{href}"{class}>{label}</a>"#)
    };

    format!(
        r#"<nav>
  <span class="brand">Shufflr</span>
  {}{}{}{}
  <span class="spacer"></span>
  <span class="user">{}</span>
  <form method="post" action="/admin/logout" class="inline"><button type="submit">Log out</button></form>
</nav>"#,
        link("/admin", "Dashboard", Nav::Dashboard),
        link("/admin/images", "Images", Nav::Images),
        link("/admin/api-keys", "API Keys", Nav::ApiKeys),
        link("/admin/settings", "Settings", Nav::Settings),
        esc(&user.username),
    )
}

fn layout(title: &str, nav: Option<(&AdminIdentity, Nav)>, flash: &Flash, body: &str) -> Html<String> {
    let nav = nav.map(|(user, active)| nav_html(user, active)).unwrap_or_default();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{} - Shufflr</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
{nav}
<main>
<h1>{}</h1>
{}
{body}
</main>
</body>
</html>"#,
        esc(title),
        esc(title),
        flash_html(flash),
    ))
}

pub fn setup_page(flash: &Flash, username: &str) -> Html<String> {
    let body = format!(
        r#"<p>Create the administrator account.</p>
<form method="post" action="/admin/setup" class="card">
  <label>Username <input name="username" value="{}" required minlength="3" autofocus></label>
  <label>Password <input type="password" name="password" required minlength="6"></label>
  <label>Confirm password <input type="password" name="confirm_password" required minlength="6"></label>
  <button type="submit">Create account</button>
</form>"#,
        attr(username)
    );
    layout("Setup", None, flash, &body)
}

pub fn login_page(flash: &Flash, username: &str) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="/admin/login" class="card">
  <label>Username <input name="username" value="{}" required autofocus></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>"#,
        attr(username)
    );
    layout("Login", None, flash, &body)
}

pub struct DashboardStats {
    pub enabled_images: u64,
    pub total_images: u64,
    pub api_keys: usize,
    pub active_api_keys: usize,
    pub requests: u64,
}

pub fn dashboard_page(
    user: &AdminIdentity,
    flash: &Flash,
    stats: &DashboardStats,
    base_url: &str,
) -> Html<String> {
    let body = format!(
        r#"<section class="stats">
  <div class="stat"><strong>{}</strong><span>of {} images enabled</span></div>
  <div class="stat"><strong>{}</strong><span>of {} API keys active</span></div>
  <div class="stat"><strong>{}</strong><span>API requests</span></div>
</section>
<section class="card">
  <h2>Usage</h2>
  <pre>curl -H "X-API-Key: YOUR_KEY" "{}/api/images?count=5"</pre>
  <pre>curl -H "Authorization: Bearer YOUR_KEY" "{}/api/images"</pre>
</section>"#,
        stats.enabled_images,
        stats.total_images,
        stats.active_api_keys,
        stats.api_keys,
        stats.requests,
        esc(base_url),
        esc(base_url),
    );
    layout("Dashboard", Some((user, Nav::Dashboard)), flash, &body)
}

fn image_row(image: &ImageFile) -> String {
    let name = attr(&image.filename);
    let preview = attr(&format!(
        "/admin/images/serve/{}",
        urlencoding::encode(&image.filename)
    ));
    let (status, toggle_to, toggle_label) = if image.enabled {
        ("Enabled", "false", "Disable")
    } else {
        ("Disabled", "true", "Enable")
    };

    format!(
        r#"<tr class="{}">
  <td><a href="{preview}"><img src="{preview}" alt="" class="thumb"></a></td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
  <td class="actions">
    <form method="post" action="/admin/images/toggle" class="inline">
      <input type="hidden" name="filename" value="{name}"><input type="hidden" name="enabled" value="{toggle_to}">
      <button type="submit">{toggle_label}</button>
    </form>
    <form method="post" action="/admin/images/rename" class="inline">
      <input type="hidden" name="old_filename" value="{name}">
      <input name="new_filename" value="{name}" maxlength="255" required>
      <button type="submit">Rename</button>
    </form>
    <form method="post" action="/admin/images/delete" class="inline">
      <input type="hidden" name="filename" value="{name}">
      <button type="submit" class="danger">Delete</button>
    </form>
  </td>
</tr>"#,
        if image.enabled { "enabled" } else { "disabled" },
        esc(&image.filename),
        format_file_size(image.size),
        format_date(&image.uploaded_at),
        status,
    )
}

pub fn images_page(user: &AdminIdentity, flash: &Flash, summary: &CatalogueSummary) -> Html<String> {
    let rows: String = summary.images.iter().map(image_row).collect();
    let table = if summary.images.is_empty() {
        "<p>No images uploaded yet.</p>".to_string()
    } else {
        format!(
            r"<table>
<thead><tr><th></th><th>Filename</th><th>Size</th><th>Uploaded</th><th>Status</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"
        )
    };

    let body = format!(
        r#"<p><a class="button" href="/admin/images/upload">Upload images</a></p>
<p>{} images ({} enabled), {} total.</p>
{table}"#,
        summary.images.len(),
        summary.enabled_count,
        format_file_size(summary.total_size),
    );
    layout("Images", Some((user, Nav::Images)), flash, &body)
}

pub fn upload_page(user: &AdminIdentity, flash: &Flash) -> Html<String> {
    let body = r#"<form method="post" action="/admin/images/upload" enctype="multipart/form-data" class="card">
  <label>Images <input type="file" name="images" accept="image/jpeg,image/png,image/gif,image/webp" multiple required></label>
  <button type="submit">Upload</button>
</form>"#;
    layout("Upload Images", Some((user, Nav::Images)), flash, body)
}

fn key_row(entry: &ApiKeyUsage) -> String {
    let key: &ApiKey = &entry.key;
    let (status, toggle_to, toggle_label) = if key.enabled {
        ("Enabled", "false", "Disable")
    } else {
        ("Disabled", "true", "Enable")
    };
    let last_used = key
        .last_used_at
        .as_deref()
        .map_or_else(|| "Never".to_string(), format_timestamp);

    format!(
        r#"<tr>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
  <td>{}</td>
  <td class="actions">
    <form method="post" action="/admin/api-keys/toggle" class="inline">
      <input type="hidden" name="key_id" value="{id}"><input type="hidden" name="enabled" value="{toggle_to}">
      <button type="submit">{toggle_label}</button>
    </form>
    <form method="post" action="/admin/api-keys/regenerate" class="inline">
      <input type="hidden" name="key_id" value="{id}">
      <button type="submit">Regenerate</button>
    </form>
    <form method="post" action="/admin/api-keys/delete" class="inline">
      <input type="hidden" name="key_id" value="{id}">
      <button type="submit" class="danger">Delete</button>
    </form>
  </td>
</tr>"#,
        esc(&key.name),
        status,
        format_timestamp(&key.created_at),
        esc(&last_used),
        entry.request_count,
        id = key.id,
    )
}

pub fn api_keys_page(user: &AdminIdentity, flash: &Flash, keys: &[ApiKeyUsage]) -> Html<String> {
    let table = if keys.is_empty() {
        "<p>No API keys yet.</p>".to_string()
    } else {
        let rows: String = keys.iter().map(key_row).collect();
        format!(
            r"<table>
<thead><tr><th>Name</th><th>Status</th><th>Created</th><th>Last used</th><th>Requests</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"
        )
    };

    let body = format!(
        r#"<p><a class="button" href="/admin/api-keys/new">Create API key</a></p>
{table}"#
    );
    layout("API Keys", Some((user, Nav::ApiKeys)), flash, &body)
}

pub fn new_api_key_page(user: &AdminIdentity, flash: &Flash, name: &str) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="/admin/api-keys/new" class="card">
  <label>Name <input name="name" value="{}" maxlength="100" required autofocus></label>
  <button type="submit">Create</button>
</form>"#,
        attr(name)
    );
    layout("Create API Key", Some((user, Nav::ApiKeys)), flash, &body)
}

/// Shows a raw token. This is the only time it is ever displayed.
pub fn issued_api_key_page(
    user: &AdminIdentity,
    name: &str,
    token: &str,
    base_url: &str,
) -> Html<String> {
    let body = format!(
        r#"<section class="card">
  <p>API key <strong>{}</strong> is ready. Copy it now, it will not be shown again.</p>
  <pre class="token">{}</pre>
  <pre>curl -H "X-API-Key: {}" "{}/api/images"</pre>
  <p><a href="/admin/api-keys">Back to API keys</a></p>
</section>"#,
        esc(name),
        esc(token),
        esc(token),
        esc(base_url),
    );
    layout("API Key Created", Some((user, Nav::ApiKeys)), &Flash::default(), &body)
}

pub fn settings_page(user: &AdminIdentity, flash: &Flash, settings: &RuntimeSettings) -> Html<String> {
    let checked = |on: bool| if on { " checked" } else { "" };

    let body = format!(
        r#"<form method="post" action="/admin/settings" class="card">
  <label class="check"><input type="checkbox" name="require_api_key_for_images"{}> Require an API key for image requests</label>
  <label>Default image count <input type="number" name="default_image_count" min="1" value="{}"></label>
  <label>Maximum image count <input type="number" name="max_image_count" min="1" value="{}"></label>
  <label class="check"><input type="checkbox" name="cors_enabled"{}> Send CORS headers</label>
  <label>Allowed origins <input name="cors_origins" value="{}"></label>
  <button type="submit">Save settings</button>
</form>"#,
        checked(settings.require_api_key_for_images),
        settings.default_image_count,
        settings.max_image_count,
        checked(settings.cors_enabled),
        attr(&settings.cors_origins),
    );
    layout("Settings", Some((user, Nav::Settings)), flash, &body)
}
