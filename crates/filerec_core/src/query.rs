//! Filtering queries over a document snapshot.

use crate::record::Record;
use crate::store::Store;
use crate::value;
use filerec_storage::{Entry, Value};

/// A filtering operator for [`QueryBuilder::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Value equality (number-vs-string normalized).
    Eq,
    /// Value inequality.
    Ne,
    /// Strictly less than.
    Lt,
    /// Strictly greater than.
    Gt,
    /// Less than or equal.
    Le,
    /// Greater than or equal.
    Ge,
    /// Substring match for strings, membership for arrays.
    Contains,
}

/// A query over a materialized snapshot of one entity type's document.
///
/// Holds the entries in document order and narrows them through
/// consuming filter calls; matches are hydrated into [`Record`]s only
/// when terminal operations run. The snapshot is taken when the query
/// begins, so concurrent writes are not observed.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    store: Store,
    entries: Vec<Entry>,
}

impl QueryBuilder {
    pub(crate) fn new(store: Store, entries: Vec<Entry>) -> Self {
        Self { store, entries }
    }

    /// Keeps entries whose `key` field satisfies `op` against
    /// `needle`.
    ///
    /// Absent fields are treated as `null`. Entries incomparable
    /// under an ordering operator are rejected.
    #[must_use]
    pub fn filter(mut self, key: &str, op: Op, needle: &Value) -> Self {
        self.entries.retain(|entry| matches(entry, key, op, needle));
        self
    }

    /// Shorthand for [`QueryBuilder::filter`] with [`Op::Eq`].
    #[must_use]
    pub fn where_eq(self, key: &str, needle: &Value) -> Self {
        self.filter(key, Op::Eq, needle)
    }

    /// Keeps entries whose `key` field equals any of `values`.
    #[must_use]
    pub fn where_in(mut self, key: &str, values: &[Value]) -> Self {
        self.entries.retain(|entry| {
            let stored = entry.get(key).cloned().unwrap_or(Value::Null);
            values.iter().any(|v| value::values_equal(&stored, v))
        });
        self
    }

    /// Returns the number of matching entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hydrates the first matching entry, or `None` if the query is
    /// empty.
    #[must_use]
    pub fn first(&self) -> Option<Record> {
        self.entries
            .first()
            .map(|entry| Record::hydrated(self.store.clone(), entry))
    }

    /// Hydrates the first entry satisfying the extra predicate.
    #[must_use]
    pub fn first_matching(&self, predicate: impl Fn(&Entry) -> bool) -> Option<Record> {
        self.entries
            .iter()
            .find(|entry| predicate(entry))
            .map(|entry| Record::hydrated(self.store.clone(), entry))
    }

    /// Hydrates the first entry whose `key` field satisfies `op`
    /// against `needle`.
    #[must_use]
    pub fn first_where(&self, key: &str, op: Op, needle: &Value) -> Option<Record> {
        self.first_matching(|entry| matches(entry, key, op, needle))
    }

    /// Hydrates every matching entry, in document order.
    ///
    /// Returns `None` when nothing matches, not an empty vector:
    /// callers distinguish "no rows" from a list, mirroring the
    /// reference behavior this store replaces.
    #[must_use]
    pub fn all(&self) -> Option<Vec<Record>> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|entry| Record::hydrated(self.store.clone(), entry))
                .collect(),
        )
    }

    /// Maximum integer value of `key` across matching entries, `0`
    /// when empty or non-numeric.
    #[must_use]
    pub fn max(&self, key: &str) -> i64 {
        self.entries
            .iter()
            .filter_map(|entry| entry.get(key).and_then(value::as_i64))
            .max()
            .unwrap_or(0)
    }
}

fn matches(entry: &Entry, key: &str, op: Op, needle: &Value) -> bool {
    let stored = entry.get(key).cloned().unwrap_or(Value::Null);

    match op {
        Op::Eq => value::values_equal(&stored, needle),
        Op::Ne => !value::values_equal(&stored, needle),
        Op::Lt => value::compare(&stored, needle) == Some(std::cmp::Ordering::Less),
        Op::Gt => value::compare(&stored, needle) == Some(std::cmp::Ordering::Greater),
        Op::Le => matches!(
            value::compare(&stored, needle),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        Op::Ge => matches!(
            value::compare(&stored, needle),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        Op::Contains => match (&stored, needle) {
            (Value::String(haystack), Value::String(part)) => haystack.contains(part.as_str()),
            (Value::Array(items), v) => items.iter().any(|item| value::values_equal(item, v)),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::Schema;
    use crate::store::Store;
    use serde_json::json;
    use tempfile::tempdir;

    fn seeded_store(dir: &std::path::Path) -> Store {
        let schema = Schema::builder("user")
            .keys(["id", "name", "email", "age"])
            .mandatory(["name"])
            .build()
            .unwrap();
        let store = Store::open(schema, &Config::new(dir)).unwrap();

        for (name, email, age) in [
            ("Alice", "alice@example.com", 30),
            ("Bob", "bob@example.com", 25),
            ("Carol", "carol@other.org", 35),
        ] {
            let fields = [
                ("name".to_string(), json!(name)),
                ("email".to_string(), json!(email)),
                ("age".to_string(), json!(age)),
            ]
            .into_iter()
            .collect();
            store.create(&fields).unwrap();
        }
        store
    }

    #[test]
    fn equality_filter() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let query = store.query().unwrap().where_eq("name", &json!("Bob"));
        assert_eq!(query.count(), 1);
        assert_eq!(query.first().unwrap().get("age"), Some(json!(25)));
    }

    #[test]
    fn equality_normalizes_numeric_strings() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let query = store.query().unwrap().where_eq("id", &json!("2"));
        assert_eq!(query.first().unwrap().get("name"), Some(json!("Bob")));
    }

    #[test]
    fn ordering_filters() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        assert_eq!(store.query().unwrap().filter("age", Op::Gt, &json!(25)).count(), 2);
        assert_eq!(store.query().unwrap().filter("age", Op::Le, &json!(25)).count(), 1);
        assert_eq!(store.query().unwrap().filter("age", Op::Ne, &json!(30)).count(), 2);
    }

    #[test]
    fn contains_filter() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let query = store
            .query()
            .unwrap()
            .filter("email", Op::Contains, &json!("@example.com"));
        assert_eq!(query.count(), 2);
    }

    #[test]
    fn where_in_filter() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let query = store
            .query()
            .unwrap()
            .where_in("name", &[json!("Alice"), json!("Carol")]);
        assert_eq!(query.count(), 2);
    }

    #[test]
    fn missing_field_is_null() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        // No entry has a null name, and ordering against null rejects
        assert!(store.query().unwrap().where_eq("name", &json!(null)).is_empty());
        assert!(store.query().unwrap().filter("name", Op::Lt, &json!(5)).is_empty());
    }

    #[test]
    fn all_is_none_when_empty() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let empty = store.query().unwrap().where_eq("name", &json!("Nobody"));
        assert!(empty.all().is_none());

        let everyone = store.query().unwrap().all().unwrap();
        assert_eq!(everyone.len(), 3);
        // Document order preserved
        assert_eq!(everyone[0].get("name"), Some(json!("Alice")));
    }

    #[test]
    fn max_aggregate() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        assert_eq!(store.query().unwrap().max("id"), 3);
        assert_eq!(store.query().unwrap().max("age"), 35);
        assert_eq!(store.query().unwrap().where_eq("id", &json!(0)).max("id"), 0);
    }

    #[test]
    fn hydrated_records_are_persisted_snapshots() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let record = store.query().unwrap().first().unwrap();
        assert!(record.is_persisted());
    }

    #[test]
    fn first_where_and_predicate() {
        let dir = tempdir().unwrap();
        let store = seeded_store(dir.path());

        let query = store.query().unwrap();
        let bob = query.first_where("age", Op::Lt, &json!(30)).unwrap();
        assert_eq!(bob.get("name"), Some(json!("Bob")));

        let carol = query
            .first_matching(|entry| entry.get("email").and_then(Value::as_str).is_some_and(|e| e.ends_with(".org")))
            .unwrap();
        assert_eq!(carol.get("name"), Some(json!("Carol")));
    }
}
