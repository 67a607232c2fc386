use serde_json::Value;

use crate::models::{Category, Project};

/// Field aliases the directory backend has used over time. First alias
/// producing a non-empty list wins.
const VIDEO_ALIASES: [&str; 3] = ["video_url", "video_urls", "videos"];
const SHOT_ALIASES: [&str; 3] = ["screenshots", "images", "shots"];
/// GLB/GLTF-style fields are preferred over the legacy FBX column.
const MODEL_ALIASES: [&str; 4] = ["glb_path", "model_path", "model_file", "fbx_path"];

fn has_url_scheme(s: &str) -> bool {
    for scheme in ["http:", "https:", "blob:", "data:"] {
        if s.len() >= scheme.len() && s[..scheme.len()].eq_ignore_ascii_case(scheme) {
            return true;
        }
    }
    false
}

/// Root a backend path at the site root unless it is already absolute.
/// Empty stays empty so optional fields remain optional.
pub fn to_public_path(p: &str) -> String {
    let t = p.trim();
    if t.is_empty() {
        return String::new();
    }
    if has_url_scheme(t) {
        return t.to_string();
    }
    if t.starts_with('/') {
        t.to_string()
    } else {
        format!("/{}", t)
    }
}

/// Tags arrive either as a JSON array or as a JSON-encoded string of one.
/// Anything that does not parse to a list of strings is an empty set.
pub fn tag_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => collect_strings(items),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => collect_strings(&items),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Media list fields are looser than tags: a genuine array, a JSON-encoded
/// array, or a single bare string all normalize to a list. An unparsable
/// non-empty string is kept as a singleton rather than dropped.
pub fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => collect_strings(items),
        Some(Value::String(s)) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                return collect_strings(&items);
            }
            let t = s.trim();
            if t.is_empty() {
                Vec::new()
            } else {
                vec![t.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn first_alias_list(v: &Value, aliases: &[&str]) -> Vec<String> {
    for name in aliases {
        let list = string_list(v.get(*name));
        if !list.is_empty() {
            return list;
        }
    }
    Vec::new()
}

fn read_string(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn read_id(v: &Value) -> String {
    match v.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn read_bool(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        // MySQL tinyint comes through as a number, sometimes as "0"/"1"
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "TRUE"),
        _ => false,
    }
}

/// Turn one raw directory record into a normalized `Project`.
/// Pure shape work; malformed fields degrade to empty values, never errors.
pub fn project_from_value(v: &Value) -> Project {
    let videos = first_alias_list(v, &VIDEO_ALIASES)
        .iter()
        .map(|s| to_public_path(s))
        .collect();
    let screenshots: Vec<String> = first_alias_list(v, &SHOT_ALIASES)
        .iter()
        .map(|s| to_public_path(s))
        .collect();

    let model_url = MODEL_ALIASES
        .iter()
        .map(|name| read_string(v, name))
        .find(|s| !s.is_empty())
        .map(|s| to_public_path(&s));

    let project_url = {
        let raw = read_string(v, "project_url");
        if raw.is_empty() {
            None
        } else {
            Some(to_public_path(&raw))
        }
    };

    Project {
        id: read_id(v),
        title: read_string(v, "title"),
        category: Category::from_str(&read_string(v, "category")),
        description: read_string(v, "description"),
        tags: tag_list(v.get("tags")),
        thumbnail: to_public_path(&read_string(v, "thumbnail")),
        videos,
        screenshots,
        model_url,
        project_url,
        featured: read_bool(v.get("featured")),
        created_at: v
            .get("created_at")
            .and_then(|x| x.as_str())
            .map(String::from),
    }
}
