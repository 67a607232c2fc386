use eframe::egui::{self, Color32, RichText};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tokio::sync::Semaphore;

use folioview::api;
use folioview::app_state::{AppView, ChatState, ContactState, Msg};
use folioview::chat_panel::render_chat_panel;
use folioview::config::{read_config, save_config};
use folioview::contact_panel::render_contact_panel;
use folioview::gallery::{GalleryController, Phase, Preview, WarmPlan};
use folioview::helpers::{format_file_size, is_likely_image};
use folioview::icon;
use folioview::logger::{log_error, log_line};
use folioview::models::{Category, ChatMessage, ChatRole, Config, Project};
use folioview::scheduler::{TaskError, run_limited};
use folioview::viewer;

/// Decoded thumbnails uploaded as textures per frame, to keep frames smooth
/// while a batch of covers arrives.
const UPLOADS_PER_FRAME: usize = 3;

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    let icon = icon::generate_icon(256);
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 820.0])
        .with_icon(icon);
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "FolioView",
        options,
        Box::new(|cc| Box::new(FolioApp::new(&cc.egui_ctx))),
    )
}

/// The preview modal currently open, if any. Model previews keep the
/// canonical URL and re-resolve it every frame so a warm-up finishing while
/// the modal is open transparently upgrades it to the local copy.
enum ActiveModal {
    Image {
        title: String,
        src: String,
    },
    Model {
        title: String,
        canonical: String,
    },
    Gallery {
        title: String,
        media: Vec<MediaEntry>,
        index: usize,
    },
}

#[derive(Clone)]
enum MediaEntry {
    Video(String),
    Shot(String),
}

struct FolioApp {
    // Config/state
    config: Config,
    config_draft: Option<Config>,
    view: AppView,
    gallery: GalleryController,
    filter_text: String,

    // Background task channel
    tx: Sender<Msg>,
    rx: Receiver<Msg>,

    // Texture pipeline
    textures: HashMap<String, egui::TextureHandle>,
    pending_thumbs: HashSet<String>,
    failed_thumbs: HashSet<String>,
    pending_uploads: VecDeque<(String, Vec<u8>, u32, u32)>,
    decode_sem: Arc<Semaphore>,
    fetch_sem: Arc<Semaphore>,

    // UI state
    modal: Option<ActiveModal>,
    chat: ChatState,
    contact: ContactState,
    last_action_error: Option<String>,
}

impl FolioApp {
    fn new(ctx: &egui::Context) -> Self {
        let config = read_config();
        apply_theme(ctx, &config);
        log_line("folioview started");

        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            config,
            config_draft: None,
            view: AppView::Projects,
            gallery: GalleryController::new(),
            filter_text: String::new(),
            tx,
            rx,
            textures: HashMap::new(),
            pending_thumbs: HashSet::new(),
            failed_thumbs: HashSet::new(),
            pending_uploads: VecDeque::new(),
            decode_sem: Arc::new(Semaphore::new(2)),
            fetch_sem: Arc::new(Semaphore::new(4)),
            modal: None,
            chat: ChatState::default(),
            contact: ContactState::default(),
            last_action_error: None,
        };
        app.start_load(None);
        app
    }

    /// Kick off a list fetch for a filter selection. The previous fetch and
    /// warm-up are cancelled by the controller; their late results will fail
    /// the generation check and fall on the floor.
    fn start_load(&mut self, category: Option<Category>) {
        let ticket = self.gallery.begin_load(category);
        let base = self.config.api_base.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api::fetch_projects_logged(&base, category).await;
            if !ticket.cancel.is_cancelled() {
                let _ = tx.send(Msg::ProjectsLoaded {
                    generation: ticket.generation,
                    result,
                });
            }
        });
    }

    /// Run the warm-up plan through the bounded scheduler. Every task posts
    /// its own completion so the gallery upgrades one entry at a time.
    fn start_warm(&mut self, plan: WarmPlan) {
        let base = self.config.api_base.clone();
        let tx = self.tx.clone();
        let workers = self.config.warm_workers();
        tokio::spawn(async move {
            let WarmPlan {
                generation,
                urls,
                cancel,
            } = plan;
            let total = urls.len();
            let tasks: Vec<_> = urls
                .into_iter()
                .map(|url| {
                    let base = base.clone();
                    let cancel = cancel.clone();
                    let tx = tx.clone();
                    move || async move {
                        if cancel.is_cancelled() {
                            return Err(TaskError::Cancelled);
                        }
                        match api::fetch_media(&base, &url).await {
                            Ok(bytes) => {
                                if cancel.is_cancelled() {
                                    return Err(TaskError::Cancelled);
                                }
                                let _ = tx.send(Msg::MediaWarmed {
                                    generation,
                                    url,
                                    result: Ok(bytes),
                                });
                                Ok(())
                            }
                            Err(e) => {
                                let err = TaskError::Failed(e.to_string());
                                let _ = tx.send(Msg::MediaWarmed {
                                    generation,
                                    url,
                                    result: Err(err.clone()),
                                });
                                Err(err)
                            }
                        }
                    }
                })
                .collect();
            let results = run_limited(tasks, workers).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                log_line(&format!("warm-up finished: {}/{} failed", failed, total));
            }
            let _ = tx.send(Msg::WarmFinished { generation, failed });
        });
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                Msg::ProjectsLoaded { generation, result } => {
                    if let Some(plan) = self.gallery.finish_load(generation, result) {
                        self.start_warm(plan);
                    }
                }
                Msg::MediaWarmed {
                    generation,
                    url,
                    result,
                } => {
                    self.gallery.media_warmed(generation, &url, result);
                    // Warmed images can upgrade an already-rendered card.
                    if is_likely_image(&url) && !self.textures.contains_key(&url) {
                        if let Some(bytes) = self.gallery.cache().bytes_for_remote(&url) {
                            self.pending_thumbs.insert(url.clone());
                            self.start_decode(url, bytes);
                        }
                    }
                }
                Msg::WarmFinished { generation, .. } => {
                    self.gallery.warm_finished(generation);
                }
                Msg::ThumbFetched { url, result } => match result {
                    Ok(bytes) => self.start_decode(url, Arc::new(bytes)),
                    Err(e) => {
                        log_line(&format!("thumbnail fetch failed for {}: {}", url, e));
                        self.pending_thumbs.remove(&url);
                        self.failed_thumbs.insert(url);
                    }
                },
                Msg::ThumbDecoded {
                    url,
                    rgba,
                    width,
                    height,
                } => {
                    self.pending_uploads.push_back((url, rgba, width, height));
                }
                Msg::ThumbFailed { url } => {
                    self.pending_thumbs.remove(&url);
                    self.failed_thumbs.insert(url);
                }
                Msg::AssistantReplied(text) => {
                    self.chat.busy = false;
                    self.chat.messages.push(ChatMessage {
                        role: ChatRole::Assistant,
                        text,
                    });
                }
                Msg::ContactSent(result) => match result {
                    Ok(()) => self.contact.reset_after_send(),
                    Err(e) => {
                        self.contact.sending = false;
                        self.contact.error = Some(e);
                    }
                },
            }
        }
    }

    /// Upload a few decoded thumbnails per frame.
    fn process_pending_uploads(&mut self, ctx: &egui::Context) {
        for _ in 0..UPLOADS_PER_FRAME {
            let Some((url, rgba, width, height)) = self.pending_uploads.pop_front() else {
                break;
            };
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                &rgba,
            );
            let handle = ctx.load_texture(&url, image, Default::default());
            self.textures.insert(url.clone(), handle);
            self.pending_thumbs.remove(&url);
        }
    }

    /// Make sure a texture for `url` is on its way: cached bytes decode
    /// directly, everything else falls back to a direct fetch of the remote
    /// URL so rendering never depends on warm-up having succeeded.
    fn ensure_thumb(&mut self, url: &str) {
        if url.is_empty()
            || self.textures.contains_key(url)
            || self.pending_thumbs.contains(url)
            || self.failed_thumbs.contains(url)
        {
            return;
        }
        self.pending_thumbs.insert(url.to_string());
        if let Some(bytes) = self.gallery.cache().bytes_for_remote(url) {
            self.start_decode(url.to_string(), bytes);
            return;
        }
        // Object URLs resolve against the cache only; no network for them.
        if url.starts_with("blob:") {
            if let Some(bytes) = self.gallery.cache().bytes_for(url) {
                self.start_decode(url.to_string(), bytes);
            } else {
                self.pending_thumbs.remove(url);
                self.failed_thumbs.insert(url.to_string());
            }
            return;
        }
        let base = self.config.api_base.clone();
        let target = url.to_string();
        let tx = self.tx.clone();
        let sem = Arc::clone(&self.fetch_sem);
        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let result = api::fetch_media(&base, &target)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Msg::ThumbFetched {
                url: target,
                result,
            });
        });
    }

    fn start_decode(&self, url: String, bytes: Arc<Vec<u8>>) {
        let tx = self.tx.clone();
        let sem = Arc::clone(&self.decode_sem);
        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let decoded = tokio::task::spawn_blocking(move || {
                image::load_from_memory(&bytes).map(|img| {
                    let rgba = img.to_rgba8();
                    let (w, h) = rgba.dimensions();
                    (rgba.into_raw(), w, h)
                })
            })
            .await;
            match decoded {
                Ok(Ok((rgba, width, height))) => {
                    let _ = tx.send(Msg::ThumbDecoded {
                        url,
                        rgba,
                        width,
                        height,
                    });
                }
                _ => {
                    let _ = tx.send(Msg::ThumbFailed { url });
                }
            }
        });
    }

    fn switch_view(&mut self, view: AppView) {
        if self.view == view {
            return;
        }
        if self.view == AppView::Projects {
            // Leaving the gallery tears the whole media lifecycle down.
            self.gallery.teardown();
            self.textures.clear();
            self.pending_thumbs.clear();
            self.failed_thumbs.clear();
            self.pending_uploads.clear();
            self.modal = None;
        }
        self.view = view;
        if view == AppView::Projects {
            self.gallery = GalleryController::new();
            self.start_load(None);
        }
    }

    fn open_preview(&mut self, item: &Project) {
        if item.category == Some(Category::Models) {
            if let Some(canonical) = item.model_url.clone() {
                self.modal = Some(ActiveModal::Model {
                    title: item.title.clone(),
                    canonical,
                });
            }
            return;
        }
        match self.gallery.preview_for(item) {
            Some(Preview::Image { title, src }) => {
                self.modal = Some(ActiveModal::Image { title, src });
            }
            Some(Preview::Gallery {
                title,
                videos,
                shots,
            }) => {
                let mut media: Vec<MediaEntry> =
                    videos.into_iter().map(MediaEntry::Video).collect();
                media.extend(shots.into_iter().map(MediaEntry::Shot));
                if !media.is_empty() {
                    self.modal = Some(ActiveModal::Gallery {
                        title,
                        media,
                        index: 0,
                    });
                }
            }
            Some(Preview::Model { .. }) | None => {}
        }
    }

    fn render_topbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("topbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("FolioView").heading().strong());
                ui.separator();
                let mut target = None;
                if ui
                    .selectable_label(self.view == AppView::Projects, "Projects")
                    .clicked()
                {
                    target = Some(AppView::Projects);
                }
                if ui
                    .selectable_label(self.view == AppView::Contact, "Contact")
                    .clicked()
                {
                    target = Some(AppView::Contact);
                }
                if let Some(view) = target {
                    self.switch_view(view);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() && self.config_draft.is_none() {
                        self.config_draft = Some(self.config.clone());
                    }
                });
            });
            if self.view == AppView::Projects {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    let active = self.gallery.active_category();
                    let mut select: Option<Option<Category>> = None;
                    if ui.selectable_label(active.is_none(), "All").clicked() {
                        select = Some(None);
                    }
                    for cat in Category::ALL {
                        if ui
                            .selectable_label(active == Some(cat), cat.label())
                            .clicked()
                        {
                            select = Some(Some(cat));
                        }
                    }
                    if let Some(choice) = select {
                        if choice != active {
                            self.start_load(choice);
                        }
                    }
                    ui.separator();
                    ui.add(
                        egui::TextEdit::singleline(&mut self.filter_text)
                            .hint_text("Filter by title or tag")
                            .desired_width(220.0),
                    );
                    if !self.filter_text.is_empty() && ui.button("✕").clicked() {
                        self.filter_text.clear();
                    }
                });
            }
            ui.add_space(4.0);
        });
    }

    fn filtered_items(&self) -> Vec<Project> {
        let needle = self.filter_text.trim().to_lowercase();
        self.gallery
            .items()
            .iter()
            .filter(|p| {
                if needle.is_empty() {
                    return true;
                }
                p.title.to_lowercase().contains(&needle)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    fn render_projects(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let phase = self.gallery.phase().clone();
            match phase {
                Phase::Error(message) => {
                    ui.add_space(12.0);
                    ui.colored_label(Color32::LIGHT_RED, format!("Error: {}", message));
                    if ui.button("Retry").clicked() {
                        let active = self.gallery.active_category();
                        self.start_load(active);
                    }
                    return;
                }
                Phase::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.colored_label(Color32::GRAY, "Loading…");
                    });
                }
                _ => {}
            }

            if let Some(err) = self.last_action_error.clone() {
                ui.horizontal(|ui| {
                    ui.colored_label(Color32::YELLOW, err);
                    if ui.small_button("dismiss").clicked() {
                        self.last_action_error = None;
                    }
                });
            }

            let items = self.filtered_items();
            if items.is_empty() && !self.gallery.is_loading() {
                ui.add_space(12.0);
                ui.colored_label(Color32::GRAY, "Nothing here yet.");
                return;
            }

            let mut open_item: Option<Project> = None;
            let mut open_link: Option<String> = None;
            let cover_height = if self.config.cover_height > 0.0 {
                self.config.cover_height
            } else {
                96.0
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for item in &items {
                        // queue the thumbnail before drawing the card
                        self.ensure_thumb(&item.thumbnail);
                        ui.group(|ui| {
                            ui.set_width(250.0);
                            ui.vertical(|ui| {
                                if !item.thumbnail.is_empty() {
                                    if let Some(tex) = self.textures.get(&item.thumbnail) {
                                        let size = fit_size(tex.size_vec2(), 242.0, cover_height);
                                        let button = egui::ImageButton::new((tex.id(), size))
                                            .frame(false);
                                        if ui.add(button).clicked() {
                                            open_item = Some(item.clone());
                                        }
                                    } else if self.failed_thumbs.contains(&item.thumbnail) {
                                        ui.colored_label(Color32::DARK_GRAY, "(no image)");
                                    } else {
                                        ui.add_sized(
                                            [242.0, cover_height],
                                            egui::Spinner::new(),
                                        );
                                    }
                                }
                                ui.horizontal(|ui| {
                                    ui.label(RichText::new(&item.title).strong());
                                    if item.featured {
                                        ui.label(RichText::new("★").color(Color32::GOLD));
                                    }
                                });
                                if let Some(cat) = item.category {
                                    ui.label(
                                        RichText::new(cat.label())
                                            .small()
                                            .color(Color32::LIGHT_BLUE),
                                    );
                                }
                                if !item.description.is_empty() {
                                    ui.label(RichText::new(&item.description).small());
                                }
                                if !item.tags.is_empty() {
                                    ui.label(
                                        RichText::new(item.tags.join(" · "))
                                            .small()
                                            .color(Color32::GRAY),
                                    );
                                }
                                ui.horizontal(|ui| {
                                    match item.category {
                                        Some(Category::Models) if item.model_url.is_some() => {
                                            if ui.small_button("Preview 3D").clicked() {
                                                open_item = Some(item.clone());
                                            }
                                        }
                                        Some(Category::Assets) | Some(Category::Logos) => {
                                            if ui.small_button("Preview").clicked() {
                                                open_item = Some(item.clone());
                                            }
                                        }
                                        Some(Category::Games)
                                            if item.has_gallery_media() =>
                                        {
                                            if ui.small_button("View Demo").clicked() {
                                                open_item = Some(item.clone());
                                            }
                                        }
                                        _ => {}
                                    }
                                    if let Some(link) = &item.project_url {
                                        if link.starts_with("http") && ui.small_button("View").clicked()
                                        {
                                            open_link = Some(link.clone());
                                        }
                                    }
                                });
                            });
                        });
                    }
                });
            });

            if let Some(item) = open_item {
                self.open_preview(&item);
            }
            if let Some(link) = open_link {
                if let Err(e) = viewer::open_external(&link) {
                    self.last_action_error = Some(e);
                }
            }
        });
    }

    fn render_contact(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            render_contact_panel(ui, &self.config, &mut self.contact, &self.tx);
        });
    }

    fn render_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        let mut keep_open = true;
        match modal {
            ActiveModal::Image { title, src } => {
                self.ensure_thumb(&src);
                egui::Window::new(&title)
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        if let Some(tex) = self.textures.get(&src) {
                            let size = fit_size(tex.size_vec2(), 720.0, 520.0);
                            ui.image((tex.id(), size));
                        } else if self.failed_thumbs.contains(&src) {
                            ui.colored_label(Color32::LIGHT_RED, "Could not load image.");
                        } else {
                            ui.add_sized([320.0, 200.0], egui::Spinner::new());
                        }
                        if ui.button("Close").clicked() {
                            keep_open = false;
                        }
                    });
                if keep_open {
                    self.modal = Some(ActiveModal::Image { title, src });
                }
            }
            ActiveModal::Model { title, canonical } => {
                // Re-resolve every frame: the modal silently upgrades to the
                // local copy once warm-up lands.
                let src = self.gallery.resolve(&canonical);
                let cached = self.gallery.cache().bytes_for_remote(&canonical);
                egui::Window::new(format!("{} (3D preview)", title))
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        match &cached {
                            Some(bytes) => {
                                ui.label(format!(
                                    "Model cached locally ({})",
                                    format_file_size(bytes.len() as u64)
                                ));
                            }
                            None => {
                                ui.horizontal(|ui| {
                                    ui.spinner();
                                    ui.colored_label(
                                        Color32::GRAY,
                                        "Preparing local copy, remote source still works…",
                                    );
                                });
                            }
                        }
                        ui.label(RichText::new(&src).small().color(Color32::GRAY));
                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            if ui.button("Open in viewer").clicked() {
                                if let Err(e) = viewer::open_model(
                                    &self.config,
                                    &title,
                                    &canonical,
                                    cached.clone(),
                                ) {
                                    self.last_action_error = Some(e);
                                }
                            }
                            if ui.button("Close").clicked() {
                                keep_open = false;
                            }
                        });
                    });
                if keep_open {
                    self.modal = Some(ActiveModal::Model { title, canonical });
                }
            }
            ActiveModal::Gallery {
                title,
                media,
                mut index,
            } => {
                if index >= media.len() {
                    index = 0;
                }
                let count = media.len();
                ctx.input(|i| {
                    if i.key_pressed(egui::Key::ArrowRight) {
                        index = (index + 1) % count.max(1);
                    }
                    if i.key_pressed(egui::Key::ArrowLeft) {
                        index = (index + count.max(1) - 1) % count.max(1);
                    }
                });
                if let Some(MediaEntry::Shot(src)) = media.get(index) {
                    self.ensure_thumb(src);
                }
                egui::Window::new(&title)
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        match media.get(index) {
                            Some(MediaEntry::Video(url)) => {
                                ui.label(RichText::new("Video").small().color(Color32::GRAY));
                                ui.label(url);
                                if ui.button("▶ Play in browser").clicked() {
                                    let target =
                                        api::media_request_url(&self.config.api_base, url);
                                    if let Err(e) = viewer::open_external(&target) {
                                        self.last_action_error = Some(e);
                                    }
                                }
                            }
                            Some(MediaEntry::Shot(src)) => {
                                if let Some(tex) = self.textures.get(src) {
                                    let size = fit_size(tex.size_vec2(), 720.0, 480.0);
                                    ui.image((tex.id(), size));
                                } else if self.failed_thumbs.contains(src) {
                                    ui.colored_label(
                                        Color32::LIGHT_RED,
                                        "Could not load screenshot.",
                                    );
                                } else {
                                    ui.add_sized([320.0, 200.0], egui::Spinner::new());
                                }
                            }
                            None => {
                                ui.colored_label(Color32::GRAY, "No media.");
                            }
                        }
                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            if ui.button("◀ Prev").clicked() {
                                index = (index + count.max(1) - 1) % count.max(1);
                            }
                            ui.label(format!("{} / {}", index + 1, count));
                            if ui.button("Next ▶").clicked() {
                                index = (index + 1) % count.max(1);
                            }
                            if ui.button("Close").clicked() {
                                keep_open = false;
                            }
                        });
                    });
                if keep_open {
                    self.modal = Some(ActiveModal::Gallery {
                        title,
                        media,
                        index,
                    });
                }
            }
        }
    }

    fn render_chat(&mut self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("chat_toggle"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                let label = if self.chat.open { "✕ Close" } else { "💬 Chat" };
                if ui.button(label).clicked() {
                    self.chat.open = !self.chat.open;
                }
            });
        if self.chat.open {
            egui::Window::new("Portfolio Assistant")
                .collapsible(false)
                .resizable(false)
                .fixed_size(egui::vec2(340.0, 420.0))
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -56.0))
                .show(ctx, |ui| {
                    render_chat_panel(ui, &self.config, &mut self.chat, &self.tx);
                });
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let Some(mut draft) = self.config_draft.take() else {
            return;
        };
        let mut keep_open = true;
        let mut apply = false;
        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("API base");
                        ui.add_sized(
                            [280.0, 22.0],
                            egui::TextEdit::singleline(&mut draft.api_base),
                        );
                        ui.end_row();

                        ui.label("Warm-up workers");
                        ui.add(egui::Slider::new(&mut draft.warm_parallel, 1..=5));
                        ui.end_row();

                        ui.label("Cover height");
                        ui.add(egui::Slider::new(&mut draft.cover_height, 60.0..=160.0));
                        ui.end_row();

                        ui.label("Font scale");
                        ui.add(egui::Slider::new(&mut draft.font_scale, 0.8..=1.6));
                        ui.end_row();

                        ui.label("Theme");
                        ui.horizontal(|ui| {
                            ui.radio_value(&mut draft.theme, "dark".to_string(), "Dark");
                            ui.radio_value(&mut draft.theme, "light".to_string(), "Light");
                        });
                        ui.end_row();

                        ui.label("3D viewer command");
                        ui.add_sized(
                            [280.0, 22.0],
                            egui::TextEdit::singleline(&mut draft.viewer_command)
                                .hint_text("e.g. f3d --watch"),
                        );
                        ui.end_row();

                        ui.label("Assistant context");
                        ui.add_sized(
                            [280.0, 60.0],
                            egui::TextEdit::multiline(&mut draft.chat_context),
                        );
                        ui.end_row();
                    });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        apply = true;
                        keep_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        keep_open = false;
                    }
                });
            });
        if apply {
            let base_changed = draft.api_base != self.config.api_base;
            self.config = draft.clone();
            if let Err(e) = save_config(&self.config) {
                log_error("failed to save config", &e);
                self.last_action_error = Some(format!("Failed to save config: {}", e));
            }
            apply_theme(ctx, &self.config);
            if base_changed && self.view == AppView::Projects {
                let active = self.gallery.active_category();
                self.start_load(active);
            }
        }
        if keep_open {
            self.config_draft = Some(draft);
        }
    }

    fn handle_escape(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return;
        }
        if self.modal.is_some() {
            self.modal = None;
        } else if self.chat.open {
            self.chat.open = false;
        } else if self.config_draft.is_some() {
            self.config_draft = None;
        }
    }

    fn anything_in_flight(&self) -> bool {
        self.gallery.is_loading()
            || *self.gallery.phase() == Phase::Warming
            || !self.pending_uploads.is_empty()
            || !self.pending_thumbs.is_empty()
            || self.chat.busy
            || self.contact.sending
    }
}

impl eframe::App for FolioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.process_pending_uploads(ctx);
        self.handle_escape(ctx);

        self.render_topbar(ctx);
        match self.view {
            AppView::Projects => self.render_projects(ctx),
            AppView::Contact => self.render_contact(ctx),
        }
        self.render_modal(ctx);
        self.render_chat(ctx);
        self.render_settings(ctx);

        if self.anything_in_flight() {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.gallery.teardown();
        log_line("folioview shut down");
    }
}

fn apply_theme(ctx: &egui::Context, config: &Config) {
    if config.theme == "light" {
        ctx.set_visuals(egui::Visuals::light());
    } else {
        ctx.set_visuals(egui::Visuals::dark());
    }
    let scale = if config.font_scale > 0.0 {
        config.font_scale.clamp(0.5, 2.0)
    } else {
        1.0
    };
    ctx.set_pixels_per_point(scale);
}

/// Scale a texture size to fit a box while keeping the aspect ratio.
fn fit_size(size: egui::Vec2, max_w: f32, max_h: f32) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::vec2(max_w, max_h);
    }
    let scale = (max_w / size.x).min(max_h / size.y).min(1.0);
    size * scale
}
