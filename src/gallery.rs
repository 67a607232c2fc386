use std::collections::HashSet;

use crate::helpers::is_likely_image;
use crate::media_cache::MediaCache;
use crate::models::{Category, Project};
use crate::scheduler::{CancelToken, TaskError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Warming,
    Error(String),
}

/// What a click on a card should open, resolved against the cache at click
/// time so entries that warmed after the first render are picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Model { title: String, src: String },
    Image { title: String, src: String },
    Gallery { title: String, videos: Vec<String>, shots: Vec<String> },
}

/// Handle for one list fetch. The generation lets the controller discard
/// results that were superseded before they arrived.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub cancel: CancelToken,
}

/// Warm-up work computed after a successful list fetch.
#[derive(Debug, Clone)]
pub struct WarmPlan {
    pub generation: u64,
    pub urls: Vec<String>,
    pub cancel: CancelToken,
}

/// Per-view gallery state machine: list loading, cache warm-up, preview
/// selection and teardown. One instance per mounted gallery view; the media
/// cache lives and dies with it.
pub struct GalleryController {
    phase: Phase,
    active: Option<Category>,
    items: Vec<Project>,
    cache: MediaCache,
    generation: u64,
    list_cancel: Option<CancelToken>,
    warm_cancel: Option<CancelToken>,
    torn_down: bool,
}

impl Default for GalleryController {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            active: None,
            items: Vec::new(),
            cache: MediaCache::new(),
            generation: 0,
            list_cancel: None,
            warm_cancel: None,
            torn_down: false,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn items(&self) -> &[Project] {
        &self.items
    }

    pub fn active_category(&self) -> Option<Category> {
        self.active
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Start (or restart) loading the list for a filter selection. Any
    /// in-flight fetch or warm-up for the previous selection is cancelled
    /// first; the cache is left alone, it is keyed by URL, not by filter.
    pub fn begin_load(&mut self, category: Option<Category>) -> LoadTicket {
        if let Some(token) = self.list_cancel.take() {
            token.cancel();
        }
        if let Some(token) = self.warm_cancel.take() {
            token.cancel();
        }
        self.generation += 1;
        self.active = category;
        self.phase = Phase::Loading;
        let cancel = CancelToken::new();
        self.list_cancel = Some(cancel.clone());
        LoadTicket {
            generation: self.generation,
            cancel,
        }
    }

    /// Apply a finished list fetch. Stale generations (a newer fetch was
    /// issued meanwhile) are discarded without touching state. On success
    /// the item list is replaced wholesale and the warm-up plan for every
    /// uncached fetchable media URL is returned.
    pub fn finish_load(
        &mut self,
        generation: u64,
        result: Result<Vec<Project>, String>,
    ) -> Option<WarmPlan> {
        if generation != self.generation || self.torn_down {
            return None;
        }
        self.list_cancel = None;
        match result {
            Ok(items) => {
                self.items = items;
                let urls = self.warm_urls();
                if urls.is_empty() {
                    self.phase = Phase::Ready;
                    None
                } else {
                    self.phase = Phase::Warming;
                    let cancel = CancelToken::new();
                    self.warm_cancel = Some(cancel.clone());
                    Some(WarmPlan {
                        generation: self.generation,
                        urls,
                        cancel,
                    })
                }
            }
            Err(message) => {
                self.items.clear();
                self.phase = Phase::Error(message);
                None
            }
        }
    }

    /// Commit one warmed media fetch. Failures degrade silently; rendering
    /// keeps using the remote URL for that entry.
    pub fn media_warmed(
        &mut self,
        generation: u64,
        url: &str,
        result: Result<Vec<u8>, TaskError>,
    ) {
        if generation != self.generation || self.torn_down {
            return;
        }
        if let Ok(bytes) = result {
            let epoch = self.cache.epoch();
            self.cache.insert(epoch, url, bytes);
        }
    }

    /// The warm-up batch for `generation` has fully settled.
    pub fn warm_finished(&mut self, generation: u64) {
        if generation != self.generation || self.torn_down {
            return;
        }
        self.warm_cancel = None;
        if self.phase == Phase::Warming {
            self.phase = Phase::Ready;
        }
    }

    /// Best-known source for a media URL right now: the local reference if
    /// warmed, otherwise the original remote URL. Always usable.
    pub fn resolve(&self, url: &str) -> String {
        self.cache
            .get(url)
            .map(String::from)
            .unwrap_or_else(|| url.to_string())
    }

    /// Decide what a click on this item opens. Re-resolves the cache on
    /// every call, so a preview opened after warm-up completes gets the
    /// local reference even though the first render did not.
    pub fn preview_for(&self, p: &Project) -> Option<Preview> {
        match p.category {
            Some(Category::Models) => {
                let model = p.model_url.as_deref().filter(|s| !s.is_empty())?;
                Some(Preview::Model {
                    title: p.title.clone(),
                    src: self.resolve(model),
                })
            }
            Some(Category::Assets) | Some(Category::Logos) => {
                let candidate = p
                    .project_url
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(p.thumbnail.as_str());
                if candidate.is_empty() {
                    return None;
                }
                let src = if is_likely_image(candidate) {
                    self.cache.get(candidate).map(String::from)
                } else {
                    None
                }
                .or_else(|| self.cache.get(&p.thumbnail).map(String::from))
                .unwrap_or_else(|| candidate.to_string());
                Some(Preview::Image {
                    title: p.title.clone(),
                    src,
                })
            }
            Some(Category::Games) if p.has_gallery_media() => Some(Preview::Gallery {
                title: p.title.clone(),
                videos: p.videos.clone(),
                shots: p.screenshots.iter().map(|s| self.resolve(s)).collect(),
            }),
            _ => None,
        }
    }

    /// Every media URL across the current items that warming would improve:
    /// model binaries first, then thumbnails, image-like project links and
    /// screenshots. Cached and non-fetchable URLs are skipped, duplicates
    /// collapse.
    fn warm_urls(&self) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut urls = Vec::new();
        {
            let cache = &self.cache;
            let mut push = |u: &str| {
                if !u.is_empty()
                    && MediaCache::is_fetchable(u)
                    && !cache.contains(u)
                    && seen.insert(u.to_string())
                {
                    urls.push(u.to_string());
                }
            };
            for p in &self.items {
                if let Some(m) = p.model_url.as_deref() {
                    push(m);
                }
            }
            for p in &self.items {
                push(&p.thumbnail);
                if let Some(link) = p.project_url.as_deref() {
                    if is_likely_image(link) {
                        push(link);
                    }
                }
                for s in &p.screenshots {
                    push(s);
                }
            }
        }
        urls
    }

    /// Cancel everything outstanding and free the cache. Idempotent; the
    /// release itself runs exactly once even when `Drop` follows an explicit
    /// call.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(token) = self.list_cancel.take() {
            token.cancel();
        }
        if let Some(token) = self.warm_cancel.take() {
            token.cancel();
        }
        self.generation += 1;
        self.items.clear();
        self.cache.release_all();
        self.phase = Phase::Idle;
    }
}

impl Drop for GalleryController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_item(id: &str, model: &str, thumb: &str) -> Project {
        Project {
            id: id.to_string(),
            title: format!("item {}", id),
            category: Some(Category::Models),
            thumbnail: thumb.to_string(),
            model_url: Some(model.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn load_error_clears_items_and_surfaces_message() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        assert_eq!(*c.phase(), Phase::Loading);
        c.finish_load(t.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]));
        assert_eq!(c.items().len(), 1);

        let t2 = c.begin_load(Some(Category::Games));
        let plan = c.finish_load(t2.generation, Err("HTTP 500".into()));
        assert!(plan.is_none());
        assert!(c.items().is_empty());
        assert_eq!(*c.phase(), Phase::Error("HTTP 500".into()));
    }

    #[test]
    fn newer_load_supersedes_older_one() {
        let mut c = GalleryController::new();
        let old = c.begin_load(None);
        let new = c.begin_load(Some(Category::Models));
        assert!(old.cancel.is_cancelled());

        // stale result arrives late and must not apply
        let plan = c.finish_load(old.generation, Ok(vec![model_item("9", "/x.glb", "/x.png")]));
        assert!(plan.is_none());
        assert!(c.items().is_empty());
        assert_eq!(*c.phase(), Phase::Loading);

        let plan = c.finish_load(new.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]));
        assert!(plan.is_some());
        assert_eq!(c.items().len(), 1);
    }

    #[test]
    fn warm_plan_orders_models_first_and_dedups() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        let mut a = model_item("1", "/m.glb", "/t.png");
        a.screenshots = vec!["/s1.png".into(), "/s1.png".into()];
        let mut b = model_item("2", "/m.glb", "/t.png");
        b.project_url = Some("https://cdn.test/art.png".into());
        b.model_url = Some("blob:folioview/7".into()); // already local, skipped
        let plan = c.finish_load(t.generation, Ok(vec![a, b])).unwrap();
        assert_eq!(
            plan.urls,
            vec![
                "/m.glb".to_string(),
                "/t.png".to_string(),
                "/s1.png".to_string(),
                "https://cdn.test/art.png".to_string(),
            ]
        );
        assert_eq!(*c.phase(), Phase::Warming);
    }

    #[test]
    fn cached_urls_are_not_rewarmed_across_filters() {
        let mut c = GalleryController::new();
        let t = c.begin_load(Some(Category::Models));
        let plan = c
            .finish_load(t.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]))
            .unwrap();
        for url in &plan.urls {
            c.media_warmed(plan.generation, url, Ok(vec![1]));
        }
        c.warm_finished(plan.generation);
        assert_eq!(*c.phase(), Phase::Ready);

        // switching to "all" re-lists the same item; nothing left to warm
        let t2 = c.begin_load(None);
        let plan2 = c.finish_load(t2.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]));
        assert!(plan2.is_none());
        assert_eq!(*c.phase(), Phase::Ready);
    }

    #[test]
    fn stale_warm_results_are_discarded() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        let plan = c
            .finish_load(t.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]))
            .unwrap();
        let _ = c.begin_load(Some(Category::Games));
        assert!(plan.cancel.is_cancelled());
        c.media_warmed(plan.generation, "/m.glb", Ok(vec![1, 2]));
        assert!(c.cache().is_empty());
    }

    #[test]
    fn failed_warm_leaves_fallback_in_place() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        let plan = c
            .finish_load(t.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]))
            .unwrap();
        c.media_warmed(
            plan.generation,
            "/m.glb",
            Err(TaskError::Failed("HTTP 404".into())),
        );
        assert_eq!(c.resolve("/m.glb"), "/m.glb");
        let preview = c.preview_for(&model_item("1", "/m.glb", "/t.png")).unwrap();
        assert_eq!(
            preview,
            Preview::Model {
                title: "item 1".into(),
                src: "/m.glb".into()
            }
        );
    }

    #[test]
    fn preview_swaps_to_local_reference_after_warm() {
        let mut c = GalleryController::new();
        let t = c.begin_load(Some(Category::Models));
        let item = model_item("1", "/m.glb", "/t.png");
        let plan = c.finish_load(t.generation, Ok(vec![item.clone()])).unwrap();

        // before warm-up completes, the preview points at the remote URL
        match c.preview_for(&item).unwrap() {
            Preview::Model { src, .. } => assert_eq!(src, "/m.glb"),
            other => panic!("unexpected preview {:?}", other),
        }

        c.media_warmed(plan.generation, "/m.glb", Ok(vec![0x67, 0x6c, 0x54, 0x46]));
        match c.preview_for(&item).unwrap() {
            Preview::Model { src, .. } => assert!(src.starts_with("blob:folioview/")),
            other => panic!("unexpected preview {:?}", other),
        }
    }

    #[test]
    fn image_preview_prefers_cached_candidate_then_thumbnail() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        let mut item = Project {
            id: "3".into(),
            title: "mark".into(),
            category: Some(Category::Logos),
            thumbnail: "/t.png".into(),
            project_url: Some("/full.png".into()),
            ..Default::default()
        };
        let plan = c.finish_load(t.generation, Ok(vec![item.clone()])).unwrap();
        c.media_warmed(plan.generation, "/t.png", Ok(vec![1]));
        // candidate not cached yet: falls back to cached thumbnail
        match c.preview_for(&item).unwrap() {
            Preview::Image { src, .. } => assert!(src.starts_with("blob:")),
            other => panic!("unexpected preview {:?}", other),
        }
        c.media_warmed(plan.generation, "/full.png", Ok(vec![2]));
        let cached_full = c.cache().get("/full.png").unwrap().to_string();
        match c.preview_for(&item).unwrap() {
            Preview::Image { src, .. } => assert_eq!(src, cached_full),
            other => panic!("unexpected preview {:?}", other),
        }
        // non-image project link never resolves through the image cache
        item.project_url = Some("https://example.com/store".into());
        match c.preview_for(&item).unwrap() {
            Preview::Image { src, .. } => assert!(src.starts_with("blob:")),
            other => panic!("unexpected preview {:?}", other),
        }
    }

    #[test]
    fn teardown_cancels_and_releases_once() {
        let mut c = GalleryController::new();
        let t = c.begin_load(None);
        let plan = c
            .finish_load(t.generation, Ok(vec![model_item("1", "/m.glb", "/t.png")]))
            .unwrap();
        c.media_warmed(plan.generation, "/m.glb", Ok(vec![1]));
        let obj = c.cache().get("/m.glb").unwrap().to_string();

        c.teardown();
        assert_eq!(*c.phase(), Phase::Idle);
        assert!(plan.cancel.is_cancelled());
        assert!(c.cache().bytes_for(&obj).is_none());
        assert!(c.cache().is_empty());

        // second teardown (e.g. Drop after explicit call) is a no-op
        c.teardown();
        assert!(c.cache().is_empty());

        // warm results landing after teardown are ignored
        c.media_warmed(plan.generation, "/t.png", Ok(vec![2]));
        assert!(c.cache().is_empty());
    }
}
