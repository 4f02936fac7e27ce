//! Engine construction tests.

mod common;

use std::sync::Arc;

use azure_blob_uploads::{
    BlobStorageEngine, MemoryBlobBackend, MissingParameter, StorageArgs, StorageError,
    StorageOptions,
};
use clap::Parser;
use common::{ACCOUNT, ACCOUNT_KEY};

fn build(options: StorageOptions) -> Result<BlobStorageEngine<MemoryBlobBackend>, StorageError> {
    BlobStorageEngine::with_backend(options, Arc::new(MemoryBlobBackend::new()))
}

fn config_error(err: StorageError) -> azure_blob_uploads::ConfigError {
    match err {
        StorageError::Config(err) => err,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_missing_container_only() {
    let err = config_error(build(StorageOptions::new().account(ACCOUNT, ACCOUNT_KEY)).unwrap_err());

    assert_eq!(err.errors, vec![MissingParameter::ContainerName]);
    assert_eq!(err.message, "There is 1 missing required parameter.");
    assert_eq!(err.to_string(), "There is 1 missing required parameter.");
}

#[test]
fn test_missing_credentials() {
    let err = config_error(build(StorageOptions::new().container_name("photos")).unwrap_err());

    assert_eq!(
        err.errors,
        vec![MissingParameter::AccessKey, MissingParameter::AccountName]
    );
    assert_eq!(err.message, "There are 2 missing required parameters.");
}

#[test]
fn test_missing_everything() {
    let err = config_error(build(StorageOptions::new()).unwrap_err());

    assert_eq!(err.len(), 3);
    assert_eq!(err.message, "There are 3 missing required parameters.");
    let messages: Vec<String> = err.errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        [
            "Missing required parameter: Azure blob storage access key.",
            "Missing required parameter: Azure blob storage account name.",
            "Missing required parameter: Azure container name.",
        ]
    );
}

#[test]
fn test_connection_string_replaces_account() {
    let conn = format!("AccountName={ACCOUNT};AccountKey={ACCOUNT_KEY};");
    assert!(build(StorageOptions::new().connection_string(conn).container_name("photos")).is_ok());
}

#[test]
fn test_blank_values_count_as_missing() {
    let err = config_error(
        build(
            StorageOptions::new()
                .account("", ACCOUNT_KEY)
                .container_name(""),
        )
        .unwrap_err(),
    );
    assert_eq!(
        err.errors,
        vec![MissingParameter::AccountName, MissingParameter::ContainerName]
    );
}

#[test]
fn test_repeated_construction_reports_fresh_errors() {
    let first = config_error(build(StorageOptions::new()).unwrap_err());
    let second = config_error(build(StorageOptions::new().container_name("photos")).unwrap_err());
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);
}

#[test]
fn test_azure_engine_validates_before_connecting() {
    let err = BlobStorageEngine::new(StorageOptions::new()).unwrap_err();
    assert_eq!(config_error(err).len(), 3);
}

#[test]
fn test_azure_engine_from_access_key() {
    let engine = BlobStorageEngine::new(
        StorageOptions::new()
            .account(ACCOUNT, ACCOUNT_KEY)
            .container_name("photos"),
    )
    .unwrap();
    assert_eq!(engine.backend().account(), ACCOUNT);
}

#[test]
fn test_engine_from_command_line() {
    let args = StorageArgs::try_parse_from([
        "uploader",
        "--account-name",
        ACCOUNT,
        "--access-key",
        ACCOUNT_KEY,
        "--container-name",
        "photos",
        "--container-access-level",
        "blob",
    ])
    .unwrap();

    assert!(build(StorageOptions::from(args)).is_ok());
}
