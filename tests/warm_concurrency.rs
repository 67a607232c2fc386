//! Warm-up pipeline properties driven through the real scheduler with a
//! counting stub in place of the network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use folioview::gallery::{GalleryController, Phase};
use folioview::models::{Category, Project};
use folioview::scheduler::{CancelToken, TaskError, run_limited};

fn stub_item(id: usize) -> Project {
    Project {
        id: id.to_string(),
        title: format!("p{}", id),
        category: Some(Category::Games),
        thumbnail: format!("/covers/{}.png", id),
        ..Default::default()
    }
}

/// A fake media server: every URL maps to bytes or an error, and the number
/// of concurrently served requests is tracked.
struct StubServer {
    responses: HashMap<String, Result<Vec<u8>, String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    hits: AtomicUsize,
}

impl StubServer {
    fn new(responses: HashMap<String, Result<Vec<u8>, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            hits: AtomicUsize::new(0),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TaskError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(e)) => Err(TaskError::Failed(e.clone())),
            None => Err(TaskError::Failed(format!("no route for {}", url))),
        }
    }
}

fn warm_tasks(
    server: &Arc<StubServer>,
    urls: &[String],
    cancel: &CancelToken,
) -> Vec<impl FnOnce() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(String, Vec<u8>), TaskError>> + Send>> + Send + 'static>
{
    urls.iter()
        .map(|url| {
            let server = Arc::clone(server);
            let url = url.clone();
            let cancel = cancel.clone();
            move || -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(String, Vec<u8>), TaskError>> + Send>> {
                Box::pin(async move {
                    if cancel.is_cancelled() {
                        return Err(TaskError::Cancelled);
                    }
                    let bytes = server.fetch(&url).await?;
                    Ok((url, bytes))
                })
            }
        })
        .collect()
}

#[tokio::test]
async fn ten_warm_tasks_never_exceed_three_in_flight() {
    let items: Vec<Project> = (0..10).map(stub_item).collect();
    let responses: HashMap<String, Result<Vec<u8>, String>> = items
        .iter()
        .map(|p| (p.thumbnail.clone(), Ok(vec![1, 2, 3])))
        .collect();
    let server = StubServer::new(responses);

    let mut gallery = GalleryController::new();
    let ticket = gallery.begin_load(None);
    let plan = gallery.finish_load(ticket.generation, Ok(items)).unwrap();
    assert_eq!(plan.urls.len(), 10);

    let tasks = warm_tasks(&server, &plan.urls, &plan.cancel);
    let results = run_limited(tasks, 3).await;
    assert_eq!(results.len(), 10);

    for result in results {
        let (url, bytes) = result.expect("stub never fails here");
        gallery.media_warmed(plan.generation, &url, Ok(bytes));
    }
    gallery.warm_finished(plan.generation);

    assert_eq!(*gallery.phase(), Phase::Ready);
    assert_eq!(gallery.cache().len(), 10);
    let peak = server.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight was {}", peak);
}

#[tokio::test]
async fn partial_failures_keep_their_slots_and_siblings() {
    let urls: Vec<String> = (0..5).map(|i| format!("/m/{}.png", i)).collect();
    let responses: HashMap<String, Result<Vec<u8>, String>> = urls
        .iter()
        .enumerate()
        .map(|(i, u)| {
            if i == 2 {
                (u.clone(), Err("HTTP 503".to_string()))
            } else {
                (u.clone(), Ok(vec![i as u8]))
            }
        })
        .collect();
    let server = StubServer::new(responses);
    let cancel = CancelToken::new();

    let tasks = warm_tasks(&server, &urls, &cancel);
    let results = run_limited(tasks, 2).await;

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        if i == 2 {
            assert_eq!(result, &Err(TaskError::Failed("HTTP 503".into())));
        } else {
            let (url, bytes) = result.as_ref().expect("sibling unaffected");
            assert_eq!(url, &urls[i]);
            assert_eq!(bytes, &vec![i as u8]);
        }
    }
}

#[tokio::test]
async fn cancelled_batch_stops_claiming_new_work() {
    let urls: Vec<String> = (0..6).map(|i| format!("/c/{}.png", i)).collect();
    let responses: HashMap<String, Result<Vec<u8>, String>> = urls
        .iter()
        .map(|u| (u.clone(), Ok(vec![9])))
        .collect();
    let server = StubServer::new(responses);
    let cancel = CancelToken::new();
    cancel.cancel();

    let tasks = warm_tasks(&server, &urls, &cancel);
    let results = run_limited(tasks, 3).await;

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r == &Err(TaskError::Cancelled)));
    assert_eq!(server.hits.load(Ordering::SeqCst), 0, "no fetch should start");
}

#[tokio::test]
async fn warming_the_same_url_twice_fetches_once() {
    // Two items sharing one cover: the warm plan dedups, so the scheduler
    // sees a single task and the cache ends up with a single entry.
    let mut a = stub_item(1);
    let b = stub_item(2);
    a.thumbnail = b.thumbnail.clone();

    let responses = HashMap::from([(a.thumbnail.clone(), Ok(vec![7]))]);
    let server = StubServer::new(responses);

    let mut gallery = GalleryController::new();
    let ticket = gallery.begin_load(None);
    let plan = gallery
        .finish_load(ticket.generation, Ok(vec![a.clone(), b]))
        .unwrap();
    assert_eq!(plan.urls.len(), 1);

    let tasks = warm_tasks(&server, &plan.urls, &plan.cancel);
    for result in run_limited(tasks, 3).await {
        let (url, bytes) = result.unwrap();
        gallery.media_warmed(plan.generation, &url, Ok(bytes));
    }
    gallery.warm_finished(plan.generation);

    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
    assert_eq!(gallery.cache().len(), 1);
}
