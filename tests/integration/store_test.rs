//! Store adapter integration tests

use slateboard::backend::store::KvStore;

#[tokio::test]
async fn test_file_store_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("store.db").display());

    {
        let store = KvStore::connect(&url).await.unwrap();
        store.set("NS:DB:ROOMS:r1", r#"{"name":"kept"}"#, None).await.unwrap();
    }

    let store = KvStore::connect(&url).await.unwrap();
    assert_eq!(
        store.get("NS:DB:ROOMS:r1").await.unwrap().as_deref(),
        Some(r#"{"name":"kept"}"#)
    );
}

#[tokio::test]
async fn test_connect_bad_path_is_store_unavailable() {
    let err = KvStore::connect("sqlite:///nonexistent-dir/definitely/missing.db")
        .await
        .err()
        .expect("connect must fail");
    assert!(matches!(
        err,
        slateboard::shared::error::SharedError::StoreUnavailable { .. }
    ));
}
