//! filerec demo: a file-backed user credential store.
//!
//! Shows the full surface: schema definition with hidden fields and a
//! password set-mutator, create/find/update/destroy, query filtering,
//! and credential verification through the injected hash capability.

use filerec_core::{Config, Entry, HashVerifier, Op, Schema, Store, Value};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

/// Hex-encoded SHA-256. A real application would use a password KDF;
/// the store only ever sees the opaque hash either way.
fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_password(value: Value) -> Value {
    match value {
        Value::String(plain) => Value::String(sha256_hex(&plain)),
        other => other,
    }
}

struct Sha256Verifier;

impl HashVerifier for Sha256Verifier {
    fn check(&self, plain: &str, hash: &str) -> bool {
        sha256_hex(plain) == hash
    }
}

fn user(name: &str, email: &str, password: &str) -> Entry {
    [
        ("name".to_string(), json!(name)),
        ("email".to_string(), json!(email)),
        ("password".to_string(), json!(password)),
    ]
    .into_iter()
    .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;

    let schema = Schema::builder("user")
        .keys([
            "id",
            "name",
            "email",
            "password",
            "remember_token",
            "created_at",
            "updated_at",
        ])
        .unique(["email"])
        .mandatory(["name", "email"])
        .hidden(["password", "remember_token"])
        .timestamps("created_at", "updated_at")
        .set_mutator("password", hash_password)
        .build()?;

    let store = Store::open(schema, &Config::new(dir.path()))?;
    println!("store backed by {}", dir.path().display());

    // Create a few users; passwords are hashed on assignment
    store.create(&user("Alice", "alice@example.com", "wonderland"))?;
    store.create(&user("Bob", "bob@example.com", "builder"))?;
    let carol = store.create(&user("Carol", "carol@other.org", "nightingale"))?;
    println!("created {} users, carol has id {:?}", 3, carol.get("id"));

    // Duplicate emails are rejected
    match store.create(&user("Impostor", "alice@example.com", "sneaky")) {
        Err(err) => println!("rejected: {err}"),
        Ok(_) => unreachable!("duplicate email must not save"),
    }

    // Lookup and external view (no password, no remember_token)
    let alice = store.find_or_fail(&json!(1))?;
    println!("alice external view: {}", json!(alice.to_external()));

    // Credential check goes through the injected capability
    let verifier = Sha256Verifier;
    println!(
        "alice login with 'wonderland': {}",
        alice.verify_secret("password", "wonderland", &verifier)
    );
    println!(
        "alice login with 'queen-of-hearts': {}",
        alice.verify_secret("password", "queen-of-hearts", &verifier)
    );

    // Query: everyone on example.com
    if let Some(matches) = store
        .query()?
        .filter("email", Op::Contains, &json!("@example.com"))
        .all()
    {
        for record in matches {
            println!("example.com user: {:?}", record.get("name"));
        }
    }

    // Update and destroy
    let renamed = store.update(&json!(2), &[("name".to_string(), json!("Robert"))].into_iter().collect())?;
    println!("renamed: {:?}", renamed.get("name"));

    store.destroy(&json!(3))?;
    println!("records left: {}", store.query()?.count());

    Ok(())
}
