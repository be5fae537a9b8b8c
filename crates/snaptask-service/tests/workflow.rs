use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;

use snaptask_core::{Screenshot, Task, TaskDraft};
use snaptask_db::Db;
use snaptask_service::{SnapService, UnpromotedFeed};
use snaptask_store::ScreenshotStore;

fn service(dir: &Path) -> SnapService {
    let files = ScreenshotStore::open(dir).unwrap();
    let db = Db::open_in_memory().unwrap();
    SnapService::new(files, db, None)
}

async fn add_screenshot(svc: &SnapService, bytes: &'static [u8]) -> Screenshot {
    svc.files().save(Bytes::from_static(bytes)).await.unwrap()
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.into(),
        ..Default::default()
    }
}

/// Pull emissions until one satisfies the predicate, failing after a few
/// tries so a broken join cannot hang the suite.
async fn next_until<F>(feed: &mut UnpromotedFeed, pred: F) -> Vec<Screenshot>
where
    F: Fn(&[Screenshot]) -> bool,
{
    for _ in 0..10 {
        let listing = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .expect("feed emission timed out")
            .expect("feed closed");
        if pred(&listing) {
            return listing;
        }
    }
    panic!("feed never reached the expected state");
}

#[tokio::test]
async fn promote_attaches_task_without_touching_image() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"image-bytes").await;

    let task = svc
        .promote(&shot.path_str(), draft("Buy milk"))
        .await
        .unwrap()
        .expect("non-empty draft promotes");
    assert!(task.id > 0);
    assert_eq!(task.image_path, shot.path_str());

    // Image untouched, task findable by path
    assert_eq!(std::fs::read(&shot.path).unwrap(), b"image-bytes");
    let found = svc.get_task_by_path(&shot.path_str()).await.unwrap();
    assert_eq!(found.unwrap().id, task.id);
}

#[tokio::test]
async fn promote_with_empty_draft_is_a_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"image-bytes").await;

    let result = svc
        .promote(&shot.path_str(), TaskDraft::default())
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(svc.get_task_by_path(&shot.path_str()).await.unwrap().is_none());
}

#[tokio::test]
async fn promote_existing_path_updates_instead_of_duplicating() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"image-bytes").await;

    let first = svc
        .promote(&shot.path_str(), draft("First title"))
        .await
        .unwrap()
        .unwrap();
    let second = svc
        .promote(&shot.path_str(), draft("Second title"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    let all = svc.list_tasks().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Second title");
}

#[tokio::test]
async fn promote_then_demote_leaves_image_byte_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"original-bytes").await;

    let task = svc
        .promote(&shot.path_str(), draft("Temporary"))
        .await
        .unwrap()
        .unwrap();
    svc.demote(&task).await.unwrap();

    assert!(svc.get_task_by_path(&shot.path_str()).await.unwrap().is_none());
    assert_eq!(std::fs::read(&shot.path).unwrap(), b"original-bytes");
    assert_eq!(svc.files().list().await.len(), 1);
}

#[tokio::test]
async fn delete_task_removes_row_and_backing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"image-bytes").await;

    let task = svc
        .promote(&shot.path_str(), draft("Doomed"))
        .await
        .unwrap()
        .unwrap();
    svc.delete_task(&task).await.unwrap();

    assert!(svc.get_task_by_path(&shot.path_str()).await.unwrap().is_none());
    assert!(!shot.path.exists());
    assert!(svc.files().list().await.is_empty());
}

#[tokio::test]
async fn delete_task_with_missing_file_still_removes_row() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());

    // Task pointing at a path that never existed (externally removed image)
    let task = svc
        .promote("/nonexistent/shot.png", draft("Dangling"))
        .await
        .unwrap()
        .unwrap();
    svc.delete_task(&task).await.unwrap();
    assert!(svc.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_image_removes_only_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let keep = add_screenshot(&svc, b"keep").await;
    let doomed = add_screenshot(&svc, b"doomed").await;

    svc.delete_image(&doomed.path).await.unwrap();
    let listing = svc.files().list().await;
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].path, keep.path);
}

#[tokio::test]
async fn delete_completed_removes_exactly_completed_tasks_and_their_files() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let done_shot = add_screenshot(&svc, b"done").await;
    let open_shot = add_screenshot(&svc, b"open").await;

    let done = svc
        .promote(&done_shot.path_str(), draft("Done"))
        .await
        .unwrap()
        .unwrap();
    svc.toggle_completed(&done).await.unwrap();
    svc.promote(&open_shot.path_str(), draft("Open"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(svc.delete_completed().await.unwrap(), 1);

    let remaining = svc.list_tasks().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Open");
    assert!(!done_shot.path.exists());
    assert!(open_shot.path.exists());
}

#[tokio::test]
async fn save_task_inserts_then_updates() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());

    let task = Task::from_draft("/shots/a.png", draft("New"));
    let saved = svc.save_task(task).await.unwrap();
    assert!(saved.id > 0);

    let mut edited = saved.clone();
    edited.title = "Edited".into();
    edited.due_date = Some(Utc::now());
    svc.save_task(edited).await.unwrap();

    let fetched = svc.get_task(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Edited");
    assert!(fetched.due_date.is_some());
}

#[tokio::test]
async fn suggest_without_client_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"bytes").await;
    assert!(svc.suggest(&shot.path).await.is_none());
}

#[tokio::test]
async fn unpromoted_view_is_listing_minus_task_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let snap = add_screenshot(&svc, b"snap").await;
    let promoted = add_screenshot(&svc, b"promoted").await;
    svc.promote(&promoted.path_str(), draft("Promoted"))
        .await
        .unwrap()
        .unwrap();

    let mut feed = svc.observe_unpromoted().unwrap();
    let listing = next_until(&mut feed, |l| {
        l.len() == 1 && l[0].path == snap.path
    })
    .await;
    assert_eq!(listing[0].path, snap.path);
}

#[tokio::test]
async fn unpromoted_view_rederives_on_task_change_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let a = add_screenshot(&svc, b"a").await;
    let b = add_screenshot(&svc, b"b").await;

    let mut feed = svc.observe_unpromoted().unwrap();
    next_until(&mut feed, |l| l.len() == 2).await;

    // No file changed; only the task table did. Exactly one image must leave
    // the derived view.
    svc.promote(&a.path_str(), draft("A")).await.unwrap().unwrap();
    let listing = next_until(&mut feed, |l| l.len() == 1).await;
    assert_eq!(listing[0].path, b.path);
}

#[tokio::test]
async fn unpromoted_view_rederives_on_file_change_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());

    let mut feed = svc.observe_unpromoted().unwrap();
    next_until(&mut feed, |l| l.is_empty()).await;

    let shot = add_screenshot(&svc, b"fresh").await;
    let listing = next_until(&mut feed, |l| l.len() == 1).await;
    assert_eq!(listing[0].path, shot.path);
}

#[tokio::test]
async fn demote_returns_image_to_unpromoted_view() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = service(tmp.path());
    let shot = add_screenshot(&svc, b"bytes").await;
    let task = svc
        .promote(&shot.path_str(), draft("Round trip"))
        .await
        .unwrap()
        .unwrap();

    let mut feed = svc.observe_unpromoted().unwrap();
    next_until(&mut feed, |l| l.is_empty()).await;

    svc.demote(&task).await.unwrap();
    let listing = next_until(&mut feed, |l| l.len() == 1).await;
    assert_eq!(listing[0].path, shot.path);
}
