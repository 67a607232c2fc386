use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base: String,
    #[serde(default)]
    pub theme: String, // "dark" | "light"
    #[serde(default)]
    pub font_scale: f32,
    #[serde(default)]
    pub warm_parallel: u32,   // background media warm-up workers
    #[serde(default)]
    pub cover_height: f32,    // card thumbnail height in points
    #[serde(default)]
    pub viewer_command: String, // external 3D model viewer, empty = open in browser
    #[serde(default)]
    pub chat_context: String,   // extra notes sent with every assistant question
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:4000".to_string(),
            theme: "dark".to_string(),
            font_scale: 1.15,
            warm_parallel: 3,
            cover_height: 96.0,
            viewer_command: String::new(),
            chat_context: String::new(),
        }
    }
}

impl Config {
    /// Warm-up worker count with the configured value clamped to a sane range.
    pub fn warm_workers(&self) -> usize {
        if self.warm_parallel == 0 {
            3
        } else {
            self.warm_parallel.clamp(1, 5) as usize
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Logos,
    Games,
    Websites,
    Assets,
    Models,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Logos,
        Category::Games,
        Category::Websites,
        Category::Assets,
        Category::Models,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Logos => "logos",
            Category::Games => "games",
            Category::Websites => "websites",
            Category::Assets => "assets",
            Category::Models => "models",
        }
    }

    pub fn from_str(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logos" => Some(Category::Logos),
            "games" => Some(Category::Games),
            "websites" => Some(Category::Websites),
            "assets" => Some(Category::Assets),
            "models" => Some(Category::Models),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Logos => "Logos",
            Category::Games => "Games",
            Category::Websites => "Websites",
            Category::Assets => "UI Assets",
            Category::Models => "3D Models",
        }
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Category::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category: {}", s)))
    }
}

/// One normalized entry of the project directory. All URL fields are either
/// scheme-prefixed or rooted at the site root, see `normalize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub model_url: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Project {
    pub fn has_gallery_media(&self) -> bool {
        !self.videos.is_empty() || !self.screenshots.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    /// Honeypot. Never rendered; bots that fill it are dropped server-side.
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}
