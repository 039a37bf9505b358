use super::*;
use serde_json::json;

#[tokio::test]
async fn round_trips_state_values() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let value = json!({
        "entries": [{"name": "sol", "content": "int main() {}"}],
        "selected": 0
    });

    storage
        .store_value("alice", "submissions", &value)
        .await
        .expect("store");
    let loaded = storage
        .load_value("alice", "submissions")
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded, value);
}

#[tokio::test]
async fn returns_none_for_absent_key() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let loaded = storage
        .load_value("alice", "submissions")
        .await
        .expect("load");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn overwrites_existing_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .store_value("alice", "selected", &json!(2))
        .await
        .expect("first store");
    storage
        .store_value("alice", "selected", &json!(null))
        .await
        .expect("second store");

    let loaded = storage
        .load_value("alice", "selected")
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded, json!(null));
}

#[tokio::test]
async fn scopes_values_per_user() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .store_value("alice", "selected", &json!(1))
        .await
        .expect("store");

    assert!(storage
        .load_value("bob", "selected")
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn last_saved_at_reflects_writes() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage
        .last_saved_at("alice")
        .await
        .expect("query")
        .is_none());

    storage
        .store_value("alice", "selected", &json!(0))
        .await
        .expect("store");
    assert!(storage
        .last_saved_at("alice")
        .await
        .expect("query")
        .is_some());
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("workbench_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("workbench.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
