use std::time::Duration;

use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;

use crate::logger::{log_error, log_line};
use crate::models::{Category, ContactForm, Project};
use crate::normalize;

/// Shown by the chat widget whenever the assistant path fails; raw error
/// detail goes to the log only.
pub const ASSISTANT_APOLOGY: &str = "Sorry—something went wrong.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("service error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

static HTTP: OnceCell<reqwest::Client> = OnceCell::new();

fn client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("folioview/0.1")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

fn base_root(base: &str) -> &str {
    base.trim().trim_end_matches('/')
}

pub fn projects_url(base: &str, category: Option<Category>) -> String {
    let mut url = format!("{}/api/projects", base_root(base));
    if let Some(cat) = category {
        url.push_str(&format!("?category={}", urlencoding::encode(cat.as_str())));
    }
    url
}

/// Canonical media URLs are absolute or site-rooted; rooted ones join the
/// configured base at request time.
pub fn media_request_url(base: &str, url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", base_root(base), url)
    } else {
        url.to_string()
    }
}

/// Query the project directory, optionally filtered by category, and
/// normalize every row.
pub async fn fetch_projects(
    base: &str,
    category: Option<Category>,
) -> Result<Vec<Project>, ApiError> {
    let url = projects_url(base, category);
    let res = client().get(&url).send().await?;
    if !res.status().is_success() {
        return Err(ApiError::Status(res.status().as_u16()));
    }
    let json: Value = res
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    let rows = json
        .as_array()
        .ok_or_else(|| ApiError::Decode("expected a JSON array of projects".into()))?;
    Ok(rows.iter().map(normalize::project_from_value).collect())
}

/// Fetch one media resource for warm-up. Non-2xx counts as failure; the
/// caller keeps the remote URL as its fallback either way.
pub async fn fetch_media(base: &str, url: &str) -> Result<Vec<u8>, ApiError> {
    let request_url = media_request_url(base, url);
    let res = client().get(&request_url).send().await?;
    if !res.status().is_success() {
        return Err(ApiError::Status(res.status().as_u16()));
    }
    let bytes = res.bytes().await?;
    Ok(bytes.to_vec())
}

/// Same shape check the site applies: something@something.tld, no spaces.
pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Client-side validation mirroring the server's checks, so obviously bad
/// submissions never reach the wire. The honeypot is not validated; it is
/// the server's signal, not ours.
pub fn validate_contact(form: &ContactForm) -> Result<(), String> {
    if form.name.trim().is_empty()
        || !is_valid_email(&form.email)
        || form.message.trim().is_empty()
    {
        return Err("Please fill out name, a valid email, and a message.".to_string());
    }
    Ok(())
}

/// Submit the contact form. The server answers `{ok: true}` on success and
/// silently accepts honeypot submissions with the same shape.
pub async fn send_contact(base: &str, form: &ContactForm) -> Result<(), ApiError> {
    validate_contact(form).map_err(ApiError::Validation)?;
    let url = format!("{}/api/contact", base_root(base));
    let res = client().post(&url).json(form).send().await?;
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);
    let ok = body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !status.is_success() || !ok {
        let detail = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Failed to send message.");
        return Err(ApiError::Upstream(detail.to_string()));
    }
    Ok(())
}

/// Ask the portfolio assistant. `context` carries optional extra notes the
/// server folds into the prompt.
pub async fn ask_assistant(base: &str, message: &str, context: &str) -> Result<String, ApiError> {
    let url = format!("{}/api/ask", base_root(base));
    let payload = serde_json::json!({ "message": message, "context": context });
    let res = client().post(&url).json(&payload).send().await?;
    if !res.status().is_success() {
        return Err(ApiError::Status(res.status().as_u16()));
    }
    let body: Value = res
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    if !body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
        let detail = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("assistant returned no reply");
        return Err(ApiError::Upstream(detail.to_string()));
    }
    let reply = body
        .get("reply")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if reply.is_empty() {
        return Err(ApiError::Upstream("assistant returned an empty reply".into()));
    }
    Ok(reply)
}

/// Wrapper that never fails outward: upstream trouble becomes a fixed
/// apology in the widget while the real error lands in the log.
pub async fn ask_assistant_safe(base: &str, message: &str, context: &str) -> String {
    match ask_assistant(base, message, context).await {
        Ok(reply) => reply,
        Err(e) => {
            log_error("assistant request failed", &e);
            ASSISTANT_APOLOGY.to_string()
        }
    }
}

/// Log-and-stringify helper for list fetches driven from the UI thread.
pub async fn fetch_projects_logged(
    base: &str,
    category: Option<Category>,
) -> Result<Vec<Project>, String> {
    match fetch_projects(base, category).await {
        Ok(items) => {
            log_line(&format!(
                "loaded {} projects (filter: {})",
                items.len(),
                category.map(|c| c.as_str()).unwrap_or("all")
            ));
            Ok(items)
        }
        Err(e) => {
            log_error("project list fetch failed", &e);
            Err(e.to_string())
        }
    }
}
