use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::Config;

fn config_file_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "folioview", "FolioView") {
        let dir = dirs.config_dir().to_path_buf();
        let _ = fs::create_dir_all(&dir);
        return dir.join("folioview.conf");
    }
    PathBuf::from("folioview.conf")
}

/// Read the config file, falling back to a local file next to the binary
/// and then to defaults. Unknown keys are ignored so old files keep working.
pub fn read_config() -> Config {
    let content = fs::read_to_string(config_file_path())
        .or_else(|_| fs::read_to_string("folioview.conf"))
        .unwrap_or_default();
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    for line in content.lines() {
        if let Some((k, v)) = line.split_once('=') {
            match k.trim() {
                "api_base" => {
                    let v = v.trim();
                    if !v.is_empty() {
                        cfg.api_base = v.trim_end_matches('/').to_string();
                    }
                }
                "theme" => cfg.theme = v.trim().to_string(),
                "font_scale" => cfg.font_scale = v.trim().parse::<f32>().unwrap_or(1.15),
                "warm_parallel" => cfg.warm_parallel = v.trim().parse::<u32>().unwrap_or(3),
                "cover_height" => cfg.cover_height = v.trim().parse::<f32>().unwrap_or(96.0),
                "viewer_command" => cfg.viewer_command = v.trim().to_string(),
                "chat_context" => cfg.chat_context = v.trim().to_string(),
                _ => {}
            }
        }
    }
    cfg
}

pub fn render_config(cfg: &Config) -> String {
    let mut out = String::new();
    out.push_str(&format!("api_base={}\n", cfg.api_base));
    if !cfg.theme.is_empty() {
        out.push_str(&format!("theme={}\n", cfg.theme));
    }
    if cfg.font_scale != 0.0 {
        out.push_str(&format!("font_scale={:.2}\n", cfg.font_scale));
    }
    if cfg.warm_parallel != 0 {
        out.push_str(&format!("warm_parallel={}\n", cfg.warm_parallel));
    }
    if cfg.cover_height != 0.0 {
        out.push_str(&format!("cover_height={:.1}\n", cfg.cover_height));
    }
    if !cfg.viewer_command.trim().is_empty() {
        out.push_str(&format!("viewer_command={}\n", cfg.viewer_command));
    }
    if !cfg.chat_context.trim().is_empty() {
        out.push_str(&format!("chat_context={}\n", cfg.chat_context));
    }
    out
}

pub fn save_config(cfg: &Config) -> Result<(), io::Error> {
    let path = config_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_config(cfg))
}
