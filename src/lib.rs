pub mod api;
pub mod app_state;
pub mod chat_panel;
pub mod config;
pub mod contact_panel;
pub mod gallery;
pub mod helpers;
pub mod icon;
pub mod logger;
pub mod media_cache;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod viewer;
