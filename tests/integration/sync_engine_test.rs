//! Sync engine scenarios: optimistic toggles, races, cascade and generation

use crate::common::*;
use artline::client::state::{CollectionKind, Flag, LocalMirror};
use artline::client::storage::{self, KeyValueStore};
use artline::client::sync::{IdSource, ToggleOutcome};
use artline::shared::api::GeneratedImage;
use artline::shared::error::{ApiError, ClientError};
use artline::shared::image::{ImageRecord, RemoteImage};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_generate_appends_to_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "imageUrl": "https://x/img1.png",
            "imageId": "abc"
        })))
        .mount(&server)
        .await;

    let (engine, _store, mut rx) = engine_with(api_client(&server.uri()), LocalMirror::new());

    let generated = engine.generate("a cat in space").await.unwrap();

    assert_eq!(generated.id_source, IdSource::Remote);
    assert!(generated.appended);
    let history = engine.records(CollectionKind::History).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "abc");
    assert_eq!(history[0].image_url, "https://x/img1.png");
    assert_eq!(history[0].prompt, "a cat in space");
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image generated successfully!"]);
}

#[tokio::test]
async fn test_quota_failure_rolls_back_with_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/images/abc/love"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "quota exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (engine, _store, mut rx) = engine_with(api_client(&server.uri()), LocalMirror::new());

    let outcome = engine.toggle_flag(Flag::Love, &record("abc"), true).await;

    assert_matches!(outcome, ToggleOutcome::RolledBack(ApiError::Terminal { .. }));
    assert!(!engine.contains(CollectionKind::Loved, "abc").await);
    assert_eq!(crate::drain_descriptions!(rx), vec!["quota exceeded"]);
}

#[tokio::test]
async fn test_transport_failures_roll_back_with_generic_message() {
    let (engine, _store, mut rx) = engine_with(api_client(&unreachable_url()), LocalMirror::new());

    let outcome = engine.toggle_flag(Flag::Save, &record("abc"), true).await;

    assert_matches!(outcome, ToggleOutcome::RolledBack(ApiError::Transport { attempts: 3, .. }));
    assert!(!engine.contains(CollectionKind::Saved, "abc").await);
    assert_eq!(crate::drain_descriptions!(rx), vec!["Network or parsing error"]);
}

#[tokio::test]
async fn test_confirmed_toggle_is_persisted() {
    let backend = ScriptedBackend::new();
    let (engine, store, mut rx) = engine_with(backend, LocalMirror::new());

    let outcome = engine.toggle(Flag::Save, &record("abc")).await;

    assert_eq!(outcome, ToggleOutcome::Confirmed);
    let persisted = storage::load_mirror(&*store).await;
    assert!(persisted.contains(CollectionKind::Saved, "abc"));
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image added to your collection"]);
}

#[tokio::test]
async fn test_rollback_is_persisted() {
    let backend = ScriptedBackend::new().flag_reply(Reply::err(ApiError::terminal(Some(500), None)));
    let (engine, store, _rx) = engine_with(backend, LocalMirror::new());

    engine.toggle_flag(Flag::Love, &record("abc"), true).await;

    let persisted = storage::load_mirror(&*store).await;
    assert!(!persisted.contains(CollectionKind::Loved, "abc"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_does_not_undo_newer_confirmation() {
    // First request fails slowly; the second succeeds quickly
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::err(ApiError::terminal(None, Some("boom".to_string()))).after(500))
        .flag_reply(Reply::ok(()).after(10));
    let (engine, _store, mut rx) = engine_with(backend, LocalMirror::new());
    let target = record("abc");

    let (first, second) = tokio::join!(
        engine.toggle_flag(Flag::Love, &target, true),
        engine.toggle_flag(Flag::Love, &target, true),
    );

    assert_eq!(first, ToggleOutcome::Superseded);
    assert_eq!(second, ToggleOutcome::Confirmed);
    assert!(engine.contains(CollectionKind::Loved, "abc").await);
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image added to your favorites"]);
}

#[tokio::test(start_paused = true)]
async fn test_final_state_follows_latest_intent() {
    // Love then unlove; the love response lands last
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::ok(()).after(300))
        .flag_reply(Reply::ok(()).after(20));
    let (engine, _store, mut rx) = engine_with(backend, LocalMirror::new());
    let target = record("abc");

    let (first, second) = tokio::join!(
        engine.toggle_flag(Flag::Love, &target, true),
        engine.toggle_flag(Flag::Love, &target, false),
    );

    assert_eq!(first, ToggleOutcome::Superseded);
    assert_eq!(second, ToggleOutcome::Confirmed);
    assert!(!engine.contains(CollectionKind::Loved, "abc").await);
    assert_eq!(engine.backend().calls(), vec!["love abc true", "love abc false"]);
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image removed from your favorites"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_unlove_rolls_back_to_confirmed_state() {
    // Love fails slowly, unlove fails quickly; neither change was ever accepted
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::err(ApiError::terminal(None, Some("love failed".to_string()))).after(300))
        .flag_reply(Reply::err(ApiError::terminal(None, Some("unlove failed".to_string()))).after(20));
    let (engine, store, mut rx) = engine_with(backend, LocalMirror::new());
    let target = record("abc");

    let (first, second) = tokio::join!(
        engine.toggle_flag(Flag::Love, &target, true),
        engine.toggle_flag(Flag::Love, &target, false),
    );

    assert_eq!(first, ToggleOutcome::Superseded);
    assert_matches!(second, ToggleOutcome::RolledBack(_));
    assert!(!engine.contains(CollectionKind::Loved, "abc").await);
    assert!(!storage::load_mirror(&*store).await.contains(CollectionKind::Loved, "abc"));
    assert_eq!(crate::drain_descriptions!(rx), vec!["unlove failed"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_unlove_keeps_earlier_accepted_love() {
    // Love is accepted while unlove is still in flight; unlove then fails
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::ok(()).after(20))
        .flag_reply(Reply::err(ApiError::terminal(None, None)).after(300));
    let (engine, _store, mut rx) = engine_with(backend, LocalMirror::new());
    let target = record("abc");

    let (first, second) = tokio::join!(
        engine.toggle_flag(Flag::Love, &target, true),
        engine.toggle_flag(Flag::Love, &target, false),
    );

    assert_eq!(first, ToggleOutcome::Superseded);
    assert_matches!(second, ToggleOutcome::RolledBack(_));
    assert!(engine.contains(CollectionKind::Loved, "abc").await);
    assert_eq!(crate::drain_descriptions!(rx), vec!["Failed to update favorite status"]);
}

#[tokio::test(start_paused = true)]
async fn test_different_records_do_not_supersede_each_other() {
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::err(ApiError::terminal(None, None)).after(100))
        .flag_reply(Reply::ok(()).after(10));
    let (engine, _store, _rx) = engine_with(backend, LocalMirror::new());
    let first = record("a");
    let second = record("b");

    let (a, b) = tokio::join!(
        engine.toggle_flag(Flag::Save, &first, true),
        engine.toggle_flag(Flag::Save, &second, true),
    );

    assert_matches!(a, ToggleOutcome::RolledBack(_));
    assert_eq!(b, ToggleOutcome::Confirmed);
    assert!(!engine.contains(CollectionKind::Saved, "a").await);
    assert!(engine.contains(CollectionKind::Saved, "b").await);
}

#[tokio::test]
async fn test_cascade_deletes_once_and_clears_everywhere() {
    let target = record("x");
    let mirror = mirror_with(
        &target,
        &[CollectionKind::History, CollectionKind::Saved, CollectionKind::Loved],
    );
    let (engine, _store, mut rx) = engine_with(ScriptedBackend::new(), mirror);

    let report = engine.remove_from_history("x").await;

    for kind in CollectionKind::ALL {
        assert!(!engine.contains(kind, "x").await, "still in {}", kind);
    }
    assert_eq!(report.deleted, Ok(()));
    assert_eq!(
        engine.backend().calls(),
        vec!["save x false", "love x false", "delete x"]
    );
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image removed from your history"]);
}

#[tokio::test]
async fn test_cascade_failures_are_not_rolled_back() {
    let target = record("x");
    let mirror = mirror_with(&target, &[CollectionKind::History, CollectionKind::Loved]);
    let backend = ScriptedBackend::new()
        .flag_reply(Reply::err(ApiError::transport(3, "refused")))
        .delete_reply(Reply::err(ApiError::terminal(Some(404), None)));
    let (engine, _store, _rx) = engine_with(backend, mirror);

    let report = engine.remove_from_history("x").await;

    assert_eq!(report.saved, None);
    assert_matches!(report.loved, Some(Err(ApiError::Transport { .. })));
    assert_matches!(report.deleted, Err(ApiError::Terminal { status: Some(404), .. }));
    assert!(!engine.contains(CollectionKind::History, "x").await);
    assert!(!engine.contains(CollectionKind::Loved, "x").await);
}

#[tokio::test]
async fn test_removed_history_id_stays_removed() {
    let target = record("x");
    let (engine, _store, _rx) = engine_with(
        ScriptedBackend::new().generate_reply(Reply::ok(GeneratedImage {
            image_url: target.image_url.clone(),
            image_id: Some("x".to_string()),
        })),
        mirror_with(&target, &[CollectionKind::History]),
    );

    engine.remove_from_history("x").await;
    let generated = engine.generate("again").await.unwrap();

    assert!(!generated.appended);
    assert!(!engine.contains(CollectionKind::History, "x").await);
}

#[tokio::test]
async fn test_remove_from_collection_is_best_effort() {
    let target = record("abc");
    let backend = ScriptedBackend::new().flag_reply(Reply::err(ApiError::terminal(Some(500), None)));
    let (engine, _store, mut rx) = engine_with(backend, mirror_with(&target, &[CollectionKind::Saved]));

    let result = engine.remove_from_collection(CollectionKind::Saved, "abc").await;

    assert!(result.is_err());
    assert!(!engine.contains(CollectionKind::Saved, "abc").await);
    assert_eq!(crate::drain_descriptions!(rx), vec!["Image removed from your collection"]);
}

#[tokio::test]
async fn test_generate_without_id_uses_flagged_fallback() {
    let backend = ScriptedBackend::new().generate_reply(Reply::ok(GeneratedImage {
        image_url: "https://x/img2.png".to_string(),
        image_id: None,
    }));
    let (engine, _store, _rx) = engine_with(backend, LocalMirror::new());

    let generated = engine.generate("  a red bicycle  ").await.unwrap();

    assert_eq!(generated.id_source, IdSource::LocalFallback);
    assert!(uuid::Uuid::parse_str(&generated.record.id).is_ok());
    assert_eq!(generated.record.prompt, "a red bicycle");
    let history = engine.records(CollectionKind::History).await;
    assert_eq!(history[0].id, generated.record.id);
}

#[tokio::test]
async fn test_generate_prepends_newest_first() {
    let backend = ScriptedBackend::new()
        .generate_reply(Reply::ok(GeneratedImage {
            image_url: "https://x/1.png".to_string(),
            image_id: Some("one".to_string()),
        }))
        .generate_reply(Reply::ok(GeneratedImage {
            image_url: "https://x/2.png".to_string(),
            image_id: Some("two".to_string()),
        }));
    let (engine, _store, _rx) = engine_with(backend, LocalMirror::new());

    engine.generate("first").await.unwrap();
    engine.generate("second").await.unwrap();

    let ids: Vec<String> = engine
        .records(CollectionKind::History)
        .await
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["two", "one"]);
}

#[tokio::test]
async fn test_generate_server_error_message() {
    let backend =
        ScriptedBackend::new().generate_reply(Reply::err(ApiError::terminal(Some(500), None)));
    let (engine, _store, mut rx) = engine_with(backend, LocalMirror::new());

    let result = engine.generate("a cat").await;

    assert_matches!(result, Err(ClientError::Api(_)));
    assert!(engine.records(CollectionKind::History).await.is_empty());
    let descriptions = crate::drain_descriptions!(rx);
    crate::assert_contains!(descriptions[0], "Server error");
}

#[tokio::test]
async fn test_refresh_replaces_collection_and_keeps_it_on_failure() {
    let remote = RemoteImage {
        id: "r1".to_string(),
        image_url: "https://x/r1.png".to_string(),
        prompt: "remote".to_string(),
        created_at: "2025-03-03T00:00:00Z".to_string(),
    };
    let backend = ScriptedBackend::new()
        .list_reply(Reply::ok(vec![remote]))
        .list_reply(Reply::err(ApiError::transport(3, "refused")));
    let (engine, store, _rx) = engine_with(
        backend,
        mirror_with(&record("stale"), &[CollectionKind::Loved]),
    );

    assert_eq!(engine.refresh(CollectionKind::Loved).await, Ok(1));
    assert!(!engine.contains(CollectionKind::Loved, "stale").await);
    assert!(engine.contains(CollectionKind::Loved, "r1").await);

    assert!(engine.refresh(CollectionKind::Loved).await.is_err());
    assert!(engine.contains(CollectionKind::Loved, "r1").await);

    let raw = store.get("lovedImages").await.unwrap().unwrap();
    let persisted: Vec<ImageRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted[0].image_url, "https://x/r1.png");
    assert_eq!(
        engine.backend().calls(),
        vec!["list /api/images?filter=loved", "list /api/images?filter=loved"]
    );
}
