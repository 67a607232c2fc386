use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use crate::api::media_request_url;
use crate::helpers::{file_path_to_uri, sanitize_filename};
use crate::logger::{log_command, log_line};
use crate::models::Config;

fn preview_dir() -> PathBuf {
    let base = directories::ProjectDirs::from("com", "folioview", "FolioView")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    let dir = base.join("previews");
    let _ = fs::create_dir_all(&dir);
    dir
}

fn model_extension(src: &str) -> &'static str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    if path.to_ascii_lowercase().ends_with(".fbx") {
        "fbx"
    } else {
        "glb"
    }
}

/// Open a project link in the default browser.
pub fn open_external(url: &str) -> Result<(), String> {
    webbrowser::open(url).map_err(|e| format!("Could not open browser: {}", e))
}

/// Hand a 3D model to the configured external viewer. Warmed bytes are
/// materialized into the preview directory so the viewer gets a real file;
/// without a viewer command the model opens in the browser instead.
pub fn open_model(
    cfg: &Config,
    title: &str,
    src: &str,
    bytes: Option<Arc<Vec<u8>>>,
) -> Result<(), String> {
    let target = match bytes {
        Some(bytes) => {
            let file = preview_dir().join(format!(
                "{}.{}",
                sanitize_filename(title),
                model_extension(src)
            ));
            fs::write(&file, bytes.as_slice())
                .map_err(|e| format!("Could not write preview file: {}", e))?;
            log_line(&format!(
                "materialized cached model for '{}' at {}",
                title,
                file.display()
            ));
            ModelTarget::File(file)
        }
        None => ModelTarget::Url(media_request_url(&cfg.api_base, src)),
    };

    let command = cfg.viewer_command.trim();
    if command.is_empty() {
        let url = match &target {
            ModelTarget::File(path) => file_path_to_uri(path),
            ModelTarget::Url(url) => url.clone(),
        };
        return open_external(&url);
    }

    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or(command);
    let mut args: Vec<String> = parts.map(String::from).collect();
    args.push(match target {
        ModelTarget::File(path) => path.to_string_lossy().to_string(),
        ModelTarget::Url(url) => url,
    });
    log_command(program, &args);
    Command::new(program)
        .args(&args)
        .spawn()
        .map(|_| ())
        .map_err(|e| format!("Could not start viewer '{}': {}", program, e))
}

enum ModelTarget {
    File(PathBuf),
    Url(String),
}
