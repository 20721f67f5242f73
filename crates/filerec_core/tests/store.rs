//! End-to-end tests for the record store.

use filerec_core::{Config, CoreError, Entry, PrimaryKeyKind, Schema, Store, Value};
use serde_json::json;
use std::thread;
use tempfile::tempdir;

fn user_schema() -> Schema {
    Schema::builder("user")
        .keys([
            "id",
            "name",
            "email",
            "password",
            "remember_token",
            "email_verified_at",
            "created_at",
            "updated_at",
        ])
        .unique(["email"])
        .mandatory(["name", "email"])
        .hidden(["password", "remember_token"])
        .timestamps("created_at", "updated_at")
        .build()
        .unwrap()
}

fn open_store(dir: &std::path::Path) -> Store {
    Store::open(user_schema(), &Config::new(dir)).unwrap()
}

fn fields(pairs: &[(&str, Value)]) -> Entry {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn user(name: &str, email: &str) -> Entry {
    fields(&[
        ("name", json!(name)),
        ("email", json!(email)),
        ("password", json!("secret-hash")),
    ])
}

#[test]
fn round_trip() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let created = store.create(&user("Alice", "alice@example.com")).unwrap();
    let id = created.primary_key_value().unwrap();

    let found = store.find(&id).unwrap().unwrap();
    let external = found.to_external();

    assert_eq!(external["id"], json!(1));
    assert_eq!(external["name"], json!("Alice"));
    assert_eq!(external["email"], json!("alice@example.com"));
    assert!(external.contains_key("created_at"));
    assert!(external.contains_key("updated_at"));
}

#[test]
fn uniqueness_is_enforced() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    store.create(&user("Alice", "alice@example.com")).unwrap();

    let result = store.create(&user("Impostor", "alice@example.com"));
    assert!(matches!(
        result,
        Err(CoreError::DuplicateUniqueField { ref field }) if field == "email"
    ));
}

#[test]
fn updating_own_unique_value_is_not_a_duplicate() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    store.create(&user("Alice", "alice@example.com")).unwrap();

    // Re-saving the same email against the same row must succeed
    let updated = store
        .update(
            &json!(1),
            &fields(&[("name", json!("Alicia")), ("email", json!("alice@example.com"))]),
        )
        .unwrap();
    assert_eq!(updated.get("name"), Some(json!("Alicia")));

    // But stealing another row's email must not
    store.create(&user("Bob", "bob@example.com")).unwrap();
    let result = store.update(&json!(2), &fields(&[("email", json!("alice@example.com"))]));
    assert!(matches!(result, Err(CoreError::DuplicateUniqueField { .. })));
}

#[test]
fn mandatory_fields_block_create_and_persist_nothing() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let result = store.create(&Entry::new());
    assert!(matches!(
        result,
        Err(CoreError::MandatoryFieldMissing { ref field }) if field == "name"
    ));

    assert!(store.all().unwrap().is_none());
    assert!(!dir.path().join("user.usr").exists());
}

#[test]
fn auto_increment_is_sequential_and_never_reuses_gaps() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    for (i, (name, email)) in [
        ("Alice", "alice@example.com"),
        ("Bob", "bob@example.com"),
        ("Carol", "carol@example.com"),
    ]
    .iter()
    .enumerate()
    {
        let record = store.create(&user(name, email)).unwrap();
        assert_eq!(record.get("id"), Some(json!(i as i64 + 1)));
    }

    assert!(store.destroy(&json!(2)).unwrap());

    let fourth = store.create(&user("Dave", "dave@example.com")).unwrap();
    assert_eq!(fourth.get("id"), Some(json!(4)));
}

#[test]
fn hidden_fields_never_leak_externally() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let record = store.create(&user("Alice", "alice@example.com")).unwrap();

    let external = record.to_external();
    assert!(!external.contains_key("password"));
    assert!(!external.contains_key("remember_token"));

    // Internal storage retains the secret
    let found = store.find(&json!(1)).unwrap().unwrap();
    assert_eq!(found.get("password"), Some(json!("secret-hash")));
}

#[test]
fn find_and_find_or_fail_on_missing_records() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    assert!(store.find(&json!(999)).unwrap().is_none());

    let result = store.find_or_fail(&json!(999));
    assert!(matches!(
        result,
        Err(CoreError::NotFound { ref entity, ref id }) if entity == "user" && id == "999"
    ));

    let result = store.update(&json!(999), &fields(&[("name", json!("x"))]));
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[test]
fn update_is_idempotent_apart_from_updated_at() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store.create(&user("Alice", "alice@example.com")).unwrap();

    let once = store
        .update(&json!(1), &fields(&[("name", json!("X"))]))
        .unwrap();
    let twice = store
        .update(&json!(1), &fields(&[("name", json!("X"))]))
        .unwrap();

    let mut a = once.to_external();
    let mut b = twice.to_external();
    a.remove("updated_at");
    b.remove("updated_at");
    assert_eq!(a, b);
}

#[test]
fn created_at_is_stamped_once() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let record = store.create(&user("Alice", "alice@example.com")).unwrap();
    let created_at = record.get("created_at").unwrap();

    let updated = store
        .update(&json!(1), &fields(&[("name", json!("Alicia"))]))
        .unwrap();
    assert_eq!(updated.get("created_at"), Some(created_at));
}

#[test]
fn refresh_reloads_from_disk() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let mut stale = store.create(&user("Alice", "alice@example.com")).unwrap();
    store
        .update(&json!(1), &fields(&[("name", json!("Alicia"))]))
        .unwrap();

    assert_eq!(stale.get("name"), Some(json!("Alice")));
    assert!(stale.refresh().unwrap());
    assert_eq!(stale.get("name"), Some(json!("Alicia")));
}

#[test]
fn refresh_reports_deleted_records() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let mut record = store.create(&user("Alice", "alice@example.com")).unwrap();
    store.destroy(&json!(1)).unwrap();

    assert!(!record.refresh().unwrap());
}

#[test]
fn instance_delete_persists() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let record = store.create(&user("Alice", "alice@example.com")).unwrap();
    assert!(record.delete().unwrap());

    let reopened = open_store(dir.path());
    assert!(reopened.find(&json!(1)).unwrap().is_none());
}

#[test]
fn find_by_field() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    store.create(&user("Alice", "alice@example.com")).unwrap();
    store.create(&user("Bob", "bob@example.com")).unwrap();

    let bob = store
        .find_by("email", &json!("bob@example.com"))
        .unwrap()
        .unwrap();
    assert_eq!(bob.get("name"), Some(json!("Bob")));

    assert!(store
        .find_by("email", &json!("nobody@example.com"))
        .unwrap()
        .is_none());
}

#[test]
fn verify_secret_uses_the_injected_capability() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let record = store.create(&user("Alice", "alice@example.com")).unwrap();

    let verifier = |plain: &str, hash: &str| format!("{plain}-hash") == hash;
    assert!(record.verify_secret("password", "secret", &verifier));
    assert!(!record.verify_secret("password", "wrong", &verifier));
    assert!(!record.verify_secret("email_verified_at", "secret", &verifier));
}

#[test]
fn supplied_primary_keys_collide() {
    let dir = tempdir().unwrap();
    let schema = Schema::builder("session")
        .keys(["token", "user_id"])
        .primary_key("token", PrimaryKeyKind::Supplied)
        .build()
        .unwrap();
    let store = Store::open(schema, &Config::new(dir.path())).unwrap();

    store
        .create(&fields(&[("token", json!("abc")), ("user_id", json!(1))]))
        .unwrap();
    let result = store.create(&fields(&[("token", json!("abc")), ("user_id", json!(2))]));
    assert!(matches!(
        result,
        Err(CoreError::DuplicateUniqueField { ref field }) if field == "token"
    ));
}

#[test]
fn concurrent_creates_get_distinct_contiguous_ids() {
    const WRITERS: usize = 8;

    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                let record = store
                    .create(&user(&format!("User{i}"), &format!("user{i}@example.com")))
                    .unwrap();
                filerec_core::value::as_i64(&record.get("id").unwrap()).unwrap()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();

    assert_eq!(ids, (1..=WRITERS as i64).collect::<Vec<_>>());
    assert_eq!(store.query().unwrap().count(), WRITERS);
}

#[test]
fn corrupt_document_surfaces_storage_error() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    std::fs::write(dir.path().join("user.usr"), "{broken").unwrap();

    assert!(matches!(store.find(&json!(1)), Err(CoreError::Storage(_))));
    assert!(matches!(
        store.create(&user("Alice", "alice@example.com")),
        Err(CoreError::Storage(_))
    ));
}
