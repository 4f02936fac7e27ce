//! Removal path tests.

mod common;

use azure_blob_uploads::{
    BlobBackend, ContainerAccessLevel, FileInfo, NameResolver, StorageEngine, StorageError,
    StoredFile, CONTAINER_UNAVAILABLE_MESSAGE,
};
use common::{engine, file, options, request};

/// Descriptor of a blob that was never uploaded through the engine.
fn stored(container: &str, blob: &str) -> StoredFile {
    StoredFile {
        info: FileInfo::new("a.png", "image/png"),
        url: format!("http://127.0.0.1:10000/devstoreaccount1/{container}/{blob}"),
        blob_name: blob.to_string(),
        container_name: container.to_string(),
        etag: "\"0x0\"".to_string(),
        blob_type: "BlockBlob".to_string(),
        blob_size: 3,
        metadata: Default::default(),
    }
}

#[tokio::test]
async fn test_remove_uploaded_file() {
    let (engine, backend) = engine(options().container_name("photos"));

    let uploaded = engine
        .handle_file(&request(), file("a.png", "image/png", b"png".to_vec()))
        .await
        .unwrap();
    assert!(backend.blob("photos", &uploaded.blob_name).is_some());

    engine.remove_file(&request(), &uploaded).await.unwrap();

    assert!(backend.blob("photos", &uploaded.blob_name).is_none());
    assert_eq!(backend.delete_count(), 1);
    // Container survives.
    assert!(backend.container("photos").is_some());
}

#[tokio::test]
async fn test_remove_absent_blob_succeeds() {
    let (engine, backend) = engine(options().container_name("photos"));
    backend
        .create_container_if_not_exists("photos", ContainerAccessLevel::Private)
        .await
        .unwrap();

    engine
        .remove_file(&request(), &stored("photos", "never-uploaded.png"))
        .await
        .unwrap();
    assert_eq!(backend.delete_count(), 0);
}

#[tokio::test]
async fn test_remove_twice_succeeds() {
    let (engine, backend) = engine(options().container_name("photos"));

    let uploaded = engine
        .handle_file(&request(), file("a.png", "image/png", b"png".to_vec()))
        .await
        .unwrap();
    engine.remove_file(&request(), &uploaded).await.unwrap();
    engine.remove_file(&request(), &uploaded).await.unwrap();
    assert_eq!(backend.delete_count(), 1);
}

#[tokio::test]
async fn test_remove_from_missing_container() {
    let (engine, backend) = engine(options().container_name("photos"));

    let err = engine
        .remove_file(&request(), &stored("photos", "a.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::ContainerUnavailable { ref container } if container == "photos"));
    assert_eq!(err.to_string(), CONTAINER_UNAVAILABLE_MESSAGE);
    assert_eq!(
        err.to_string(),
        "Cannot use container. Check if provided options are correct."
    );
    assert_eq!(backend.delete_count(), 0);
    // Removal never creates containers.
    assert!(backend.container("photos").is_none());
}

#[tokio::test]
async fn test_concurrent_failed_removals_are_independent() {
    let (engine, backend) = engine(options().container_name("photos"));
    let first = stored("photos", "a.png");
    let second = stored("photos", "b.png");
    let req_a = request();
    let req_b = request();

    let (a, b) = tokio::join!(
        engine.remove_file(&req_a, &first),
        engine.remove_file(&req_b, &second),
    );

    for err in [a.unwrap_err(), b.unwrap_err()] {
        assert_eq!(err.to_string(), CONTAINER_UNAVAILABLE_MESSAGE);
    }
    assert_eq!(backend.delete_count(), 0);
}

#[tokio::test]
async fn test_remove_uses_resolved_container() {
    let by_kind = NameResolver::from_fn(|_req, file| {
        let kind = file.mime_type.split('/').next().unwrap_or_default().to_string();
        async move { Ok(kind) }
    });
    let (engine, backend) = engine(options().container_name(by_kind));

    let uploaded = engine
        .handle_file(&request(), file("a.png", "image/png", b"png".to_vec()))
        .await
        .unwrap();
    assert_eq!(uploaded.container_name, "image");

    engine.remove_file(&request(), &uploaded).await.unwrap();
    assert!(backend.list_blobs("image").is_empty());
}

#[tokio::test]
async fn test_remove_resolver_failure() {
    let failing = NameResolver::from_fn(|_req, _file| async {
        Err::<String, azure_blob_uploads::BoxError>("no tenant".into())
    });
    let (engine, backend) = engine(options().container_name(failing));

    let err = engine
        .remove_file(&request(), &stored("photos", "a.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Resolver(_)));
    assert_eq!(backend.delete_count(), 0);
}
