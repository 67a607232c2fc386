use crate::models::{ChatMessage, ContactForm, Project};
use crate::scheduler::TaskError;

/// Everything background tasks report back to the UI thread. Drained once
/// per frame; list and warm variants carry the generation they belong to so
/// superseded work is discarded instead of applied.
#[derive(Debug)]
pub enum Msg {
    ProjectsLoaded {
        generation: u64,
        result: Result<Vec<Project>, String>,
    },
    MediaWarmed {
        generation: u64,
        url: String,
        result: Result<Vec<u8>, TaskError>,
    },
    WarmFinished {
        generation: u64,
        failed: usize,
    },
    /// Direct render-path fetch for a thumbnail that was never warmed.
    ThumbFetched {
        url: String,
        result: Result<Vec<u8>, String>,
    },
    /// Background decode finished; RGBA is ready for texture upload.
    ThumbDecoded {
        url: String,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    },
    ThumbFailed {
        url: String,
    },
    AssistantReplied(String),
    ContactSent(Result<(), String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Projects,
    Contact,
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub open: bool,
    pub input: String,
    pub messages: Vec<ChatMessage>,
    pub busy: bool,
}

#[derive(Debug, Default)]
pub struct ContactState {
    pub form: ContactForm,
    pub sending: bool,
    pub done: bool,
    pub error: Option<String>,
}

impl ContactState {
    pub fn reset_after_send(&mut self) {
        self.form = ContactForm::default();
        self.sending = false;
        self.done = true;
        self.error = None;
    }
}
