//! End-to-end gallery behavior at the message level: raw directory records
//! go through normalization, the controller state machine, warm-up and
//! preview resolution without any network involved.

use folioview::gallery::{GalleryController, Phase, Preview};
use folioview::models::Category;
use folioview::normalize::project_from_value;
use folioview::scheduler::TaskError;
use serde_json::json;

#[test]
fn models_filter_load_warm_and_preview_swap() {
    // Directory returns one 3D model project with relative paths.
    let raw = json!({
        "id": 7,
        "title": "Rigged Drone",
        "category": "models",
        "description": "Quadcopter asset",
        "tags": "[\"blender\"]",
        "thumbnail": "t.png",
        "model_path": "m.glb"
    });
    let item = project_from_value(&raw);
    assert_eq!(item.thumbnail, "/t.png");
    assert_eq!(item.model_url.as_deref(), Some("/m.glb"));

    let mut gallery = GalleryController::new();
    let ticket = gallery.begin_load(Some(Category::Models));
    assert_eq!(*gallery.phase(), Phase::Loading);

    let plan = gallery
        .finish_load(ticket.generation, Ok(vec![item.clone()]))
        .expect("fresh media should need warming");
    assert_eq!(*gallery.phase(), Phase::Warming);
    assert_eq!(plan.urls, vec!["/m.glb".to_string(), "/t.png".to_string()]);

    // The card renders with the remote thumbnail before anything warms.
    assert_eq!(gallery.resolve("/t.png"), "/t.png");

    // Click opens the 3D preview pointing at the remote model.
    let before = gallery.preview_for(&item).expect("model preview");
    assert_eq!(
        before,
        Preview::Model {
            title: "Rigged Drone".into(),
            src: "/m.glb".into(),
        }
    );

    // Warm-up lands while the modal is open; re-resolution now yields the
    // local reference, the modal swaps sources transparently.
    gallery.media_warmed(plan.generation, "/m.glb", Ok(b"glTF....".to_vec()));
    let after = gallery.preview_for(&item).expect("model preview");
    match after {
        Preview::Model { src, .. } => {
            assert!(src.starts_with("blob:folioview/"));
            assert_eq!(
                gallery.cache().bytes_for(&src).unwrap().as_slice(),
                b"glTF...."
            );
        }
        other => panic!("unexpected preview {:?}", other),
    }

    gallery.media_warmed(plan.generation, "/t.png", Ok(vec![0x89, 0x50]));
    gallery.warm_finished(plan.generation);
    assert_eq!(*gallery.phase(), Phase::Ready);

    // Teardown releases every reference exactly once.
    let obj = gallery.cache().get("/m.glb").unwrap().to_string();
    gallery.teardown();
    assert!(gallery.cache().bytes_for(&obj).is_none());
    assert!(gallery.cache().is_empty());
}

#[test]
fn completion_order_does_not_matter() {
    let rows = vec![
        json!({"id": 1, "title": "A", "category": "games", "thumbnail": "a.png",
               "screenshots": ["s1.png", "s2.png"]}),
        json!({"id": 2, "title": "B", "category": "games", "thumbnail": "b.png"}),
    ];
    let items: Vec<_> = rows.iter().map(project_from_value).collect();

    let mut gallery = GalleryController::new();
    let ticket = gallery.begin_load(Some(Category::Games));
    let plan = gallery.finish_load(ticket.generation, Ok(items.clone())).unwrap();
    assert_eq!(plan.urls.len(), 4);

    // Apply completions back-to-front, with one failure in the middle.
    let mut urls = plan.urls.clone();
    urls.reverse();
    for (i, url) in urls.iter().enumerate() {
        let result = if i == 1 {
            Err(TaskError::Failed("HTTP 500".into()))
        } else {
            Ok(vec![i as u8])
        };
        gallery.media_warmed(plan.generation, url, result);
    }
    gallery.warm_finished(plan.generation);

    assert_eq!(*gallery.phase(), Phase::Ready);
    assert_eq!(gallery.cache().len(), 3);

    // The failed URL keeps its remote fallback; the rest resolve locally.
    let failed = &plan.urls[plan.urls.len() - 2];
    assert_eq!(gallery.resolve(failed), *failed);
    for url in plan.urls.iter().filter(|u| *u != failed) {
        assert!(gallery.resolve(url).starts_with("blob:folioview/"));
    }

    // The game preview picks up whatever warmed, falls back otherwise.
    match gallery.preview_for(&items[0]).unwrap() {
        Preview::Gallery { shots, .. } => {
            assert_eq!(shots.len(), 2);
            for (shot, original) in shots.iter().zip(["/s1.png", "/s2.png"]) {
                assert!(shot.starts_with("blob:") || shot == original);
            }
        }
        other => panic!("unexpected preview {:?}", other),
    }
}

#[test]
fn filter_change_cancels_and_preserves_cache() {
    let model = project_from_value(&json!({
        "id": 1, "title": "Mech", "category": "models",
        "thumbnail": "mech.png", "glb_path": "mech.glb"
    }));

    let mut gallery = GalleryController::new();
    let first = gallery.begin_load(Some(Category::Models));
    let plan = gallery.finish_load(first.generation, Ok(vec![model.clone()])).unwrap();
    gallery.media_warmed(plan.generation, "/mech.glb", Ok(vec![1]));
    gallery.media_warmed(plan.generation, "/mech.png", Ok(vec![2]));
    gallery.warm_finished(plan.generation);

    // Switch to "all": the previous generation dies, the cache survives.
    let second = gallery.begin_load(None);
    assert!(plan.cancel.is_cancelled());
    let plan2 = gallery.finish_load(second.generation, Ok(vec![model]));
    assert!(plan2.is_none(), "everything is already cached");
    assert_eq!(gallery.cache().len(), 2);
    assert_eq!(*gallery.phase(), Phase::Ready);
}
