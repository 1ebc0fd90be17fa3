//! Remote store: auth gate, merge-patch writes and subscription feeds

use board_model::{schema, ErrorKind, TeamDocument, TeamId};
use board_store::{
    DocumentService, InMemoryDocumentService, PasswordAuthenticator, RemoteStore, Snapshot,
    StoreError, TeamStore,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn team(id: &str) -> TeamId {
    TeamId::new(id).unwrap()
}

fn setup() -> (Arc<InMemoryDocumentService>, RemoteStore) {
    let service = Arc::new(InMemoryDocumentService::new());
    let auth = PasswordAuthenticator::with_iterations(1_000);
    auth.register("lead@pud", "s3cret").unwrap();
    let store = RemoteStore::new(service.clone(), Arc::new(auth));
    (service, store)
}

#[tokio::test]
async fn everything_requires_a_session() {
    let (_service, store) = setup();
    assert!(!store.is_authenticated());

    let err = store.load(&team("PUD")).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert!(store
        .save(&team("PUD"), &TeamDocument::default())
        .await
        .is_err());
    assert!(store.subscribe(&team("PUD")).await.is_err());
    assert!(store.team_ids().await.is_err());
}

#[tokio::test]
async fn rejected_sign_in_keeps_store_locked() {
    let (_service, store) = setup();
    let err = store.sign_in("lead@pud", "nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert!(store.session().is_none());
}

#[tokio::test]
async fn save_is_a_top_level_merge() {
    let (service, store) = setup();
    store.sign_in("lead@pud", "s3cret").await.unwrap();

    service
        .merge("dashboards", "PUD", json!({"teamNews": "remote", "showNews": false}))
        .await
        .unwrap();

    let doc = TeamDocument {
        team_news: Some("local".into()),
        ..TeamDocument::default()
    };
    store.save(&team("PUD"), &doc).await.unwrap();

    let stored = service.get("dashboards", "PUD").await.unwrap().unwrap();
    assert_eq!(stored["teamNews"], "local");
    assert_eq!(stored["showNews"], false);
    assert_eq!(store.team_ids().await.unwrap(), vec![team("PUD")]);
}

#[tokio::test]
async fn subscription_delivers_initial_then_changes() {
    let (service, store) = setup();
    store.sign_in("lead@pud", "s3cret").await.unwrap();

    let mut feed = store.subscribe(&team("WTH")).await.unwrap().unwrap();
    assert_eq!(feed.team(), &team("WTH"));
    assert_eq!(feed.next().await, Some(Snapshot::Absent));

    let doc = schema::default_document(&team("WTH"));
    store.save(&team("WTH"), &doc).await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(1), feed.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next, Snapshot::Present(doc));
}

#[tokio::test]
async fn sign_out_closes_feeds() {
    let (_service, store) = setup();
    store.sign_in("lead@pud", "s3cret").await.unwrap();

    let mut feed = store.subscribe(&team("SPV")).await.unwrap().unwrap();
    assert_eq!(feed.next().await, Some(Snapshot::Absent));

    store.dispose().await;
    assert!(!store.is_authenticated());

    let closed = tokio::time::timeout(Duration::from_secs(1), feed.next())
        .await
        .unwrap();
    assert_eq!(closed, None);
}

#[tokio::test]
async fn offline_service_is_sync_or_write_error() {
    let (service, store) = setup();
    store.sign_in("lead@pud", "s3cret").await.unwrap();
    service.set_offline(true);

    let read = store.load(&team("PUD")).await.unwrap_err();
    assert_eq!(read.kind(), ErrorKind::SyncError);

    let write = store
        .save(&team("PUD"), &TeamDocument::default())
        .await
        .unwrap_err();
    assert_eq!(write.kind(), ErrorKind::PersistenceWriteFailed);
}
