//! Marina Test Utilities
//!
//! Shared test infrastructure for the Marina workspace:
//! - `FaultyStore`, a store wrapper that fails chosen writes
//! - Proptest generators for entity fields and entities
//! - Fixtures for the common boat/load scenarios
//! - Bearer token minting for authenticated requests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

pub use marina_core::{
    Boat, BoatId, EntityIdType, EntityKind, Load, LoadId, LoadRef, MarinaError, MarinaResult,
    RawId, StorageError, User, UserId,
};
pub use marina_storage::{
    Document, EntityStore, Filter, InMemoryEntityStore, Key, ScanPage, StorageResult,
};

// ============================================================================
// FAULT INJECTION
// ============================================================================

/// Store operation a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Get,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
struct FaultRule {
    op: FaultOp,
    kind: EntityKind,
    /// Matching calls still to let through before failing.
    skip: usize,
    /// `None` fails forever once `skip` reaches zero.
    failures_left: Option<usize>,
}

/// Wraps a store and fails selected operations with `StorageError::Backend`.
///
/// Rules are matched on `(operation, kind)`. Calls that do not match any
/// rule, or that a rule lets through, go to the inner store untouched.
pub struct FaultyStore {
    inner: Arc<dyn EntityStore>,
    rules: Mutex<Vec<FaultRule>>,
    injected: Mutex<usize>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn EntityStore>) -> Self {
        Self {
            inner,
            rules: Mutex::new(Vec::new()),
            injected: Mutex::new(0),
        }
    }

    /// Wrap a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEntityStore::new()))
    }

    /// Fail the `n`th (1-based) matching call, once.
    pub fn fail_nth(&self, op: FaultOp, kind: EntityKind, n: usize) {
        self.push_rule(FaultRule {
            op,
            kind,
            skip: n.saturating_sub(1),
            failures_left: Some(1),
        });
    }

    /// Fail every matching call from now on.
    pub fn fail_always(&self, op: FaultOp, kind: EntityKind) {
        self.push_rule(FaultRule {
            op,
            kind,
            skip: 0,
            failures_left: None,
        });
    }

    /// Remove all rules.
    pub fn heal(&self) {
        self.rules.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of calls failed so far.
    pub fn injected_failures(&self) -> usize {
        *self.injected.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The wrapped store, for inspecting state behind the faults.
    pub fn inner(&self) -> &Arc<dyn EntityStore> {
        &self.inner
    }

    fn push_rule(&self, rule: FaultRule) {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(rule);
    }

    fn check(&self, op: FaultOp, kind: EntityKind) -> StorageResult<()> {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        let mut fail = false;
        for rule in rules.iter_mut().filter(|r| r.op == op && r.kind == kind) {
            if rule.failures_left == Some(0) {
                continue;
            }
            if rule.skip > 0 {
                rule.skip -= 1;
                continue;
            }
            if let Some(left) = rule.failures_left.as_mut() {
                *left -= 1;
            }
            fail = true;
            break;
        }
        drop(rules);

        if fail {
            *self.injected.lock().unwrap_or_else(|e| e.into_inner()) += 1;
            return Err(StorageError::backend(
                format!("{:?} {}", op, kind),
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for FaultyStore {
    async fn get(&self, kind: EntityKind, id: RawId) -> StorageResult<Option<Document>> {
        self.check(FaultOp::Get, kind)?;
        self.inner.get(kind, id).await
    }

    async fn put(&self, kind: EntityKind, key: Key, doc: Document) -> StorageResult<RawId> {
        self.check(FaultOp::Put, kind)?;
        self.inner.put(kind, key, doc).await
    }

    async fn delete(&self, kind: EntityKind, id: RawId) -> StorageResult<bool> {
        self.check(FaultOp::Delete, kind)?;
        self.inner.delete(kind, id).await
    }

    async fn scan(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<ScanPage> {
        self.inner.scan(kind, filter, limit, offset).await
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> StorageResult<usize> {
        self.inner.count(kind, filter).await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// Boat name or type: letters, digits and inner spaces.
    pub fn arb_label() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ]{0,30}[A-Za-z0-9]"
    }

    pub fn arb_content() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.'-]{0,60}"
    }

    pub fn arb_boat_length() -> impl Strategy<Value = u32> {
        1u32..=2000
    }

    pub fn arb_weight() -> impl Strategy<Value = u32> {
        1u32..=100_000
    }

    pub fn arb_delivery_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2100, 1u32..=12, 1u32..=28)
            .prop_filter_map("valid calendar date", |(y, m, d)| {
                NaiveDate::from_ymd_opt(y, m, d)
            })
    }

    pub fn arb_subject() -> impl Strategy<Value = String> {
        "[0-9]{10,21}"
    }

    /// An unassigned boat with an arbitrary id.
    pub fn arb_boat() -> impl Strategy<Value = Boat> {
        (
            1u64..10_000,
            arb_label(),
            arb_label(),
            arb_boat_length(),
            any::<bool>(),
            arb_subject(),
        )
            .prop_map(|(id, name, boat_type, length, public, owner)| Boat {
                id: BoatId::new(id),
                name,
                boat_type,
                length,
                public,
                owner,
                loads: Vec::new(),
            })
    }

    /// An unassigned load with an arbitrary id.
    pub fn arb_load() -> impl Strategy<Value = Load> {
        (1u64..10_000, arb_weight(), arb_content(), arb_delivery_date()).prop_map(
            |(id, weight, content, delivery_date)| Load {
                id: LoadId::new(id),
                weight,
                content,
                delivery_date,
                current_boat: None,
            },
        )
    }

    /// A sequence of assign (`true`) / unassign (`false`) steps over `loads`
    /// load indices.
    pub fn arb_relationship_ops(loads: usize) -> impl Strategy<Value = Vec<(bool, usize)>> {
        prop::collection::vec((any::<bool>(), 0..loads.max(1)), 0..40)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use serde_json::{json, Value};

    pub const OWNER_SUBJECT: &str = "104518023447217043855";
    pub const OTHER_SUBJECT: &str = "209918023447217043777";

    /// Body for creating the "Orca" boat.
    pub fn orca_boat_body() -> Value {
        json!({
            "name": "Orca",
            "type": "Catamaran",
            "length": 28,
            "public": true
        })
    }

    /// Body for creating a private boat with the given name.
    pub fn private_boat_body(name: &str) -> Value {
        json!({
            "name": name,
            "type": "Sloop",
            "length": 40,
            "public": false
        })
    }

    /// Body for creating a load.
    pub fn legos_load_body() -> Value {
        json!({
            "weight": 5,
            "content": "LEGO Blocks",
            "delivery_date": "2021-01-10"
        })
    }
}

// ============================================================================
// TOKENS
// ============================================================================

pub mod tokens {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    /// HS256 secret shared with the test application.
    pub const TEST_JWT_SECRET: &str = "marina-test-secret-that-is-long-enough-for-hs256";

    #[derive(Debug, Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        iat: i64,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<&'a str>,
    }

    /// Mint an HS256 token for `subject`, valid for an hour.
    pub fn bearer_for(subject: &str) -> String {
        mint(subject, TEST_JWT_SECRET, Duration::hours(1))
    }

    /// Mint a token that expired an hour ago.
    pub fn expired_bearer_for(subject: &str) -> String {
        mint(subject, TEST_JWT_SECRET, Duration::hours(-1))
    }

    pub fn mint(subject: &str, secret: &str, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = TestClaims {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            email: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token encoding should succeed");
        format!("Bearer {}", token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new()
    }

    #[tokio::test]
    async fn test_fail_nth_fails_exactly_once() {
        let store = FaultyStore::in_memory();
        store.fail_nth(FaultOp::Put, EntityKind::Load, 2);

        assert!(store.put(EntityKind::Load, Key::New, doc()).await.is_ok());
        assert!(store.put(EntityKind::Boat, Key::New, doc()).await.is_ok());
        assert!(store.put(EntityKind::Load, Key::New, doc()).await.is_err());
        assert!(store.put(EntityKind::Load, Key::New, doc()).await.is_ok());
        assert_eq!(store.injected_failures(), 1);
    }

    #[tokio::test]
    async fn test_fail_always_until_healed() {
        let store = FaultyStore::in_memory();
        store.fail_always(FaultOp::Delete, EntityKind::Boat);
        assert!(store.delete(EntityKind::Boat, 1).await.is_err());
        assert!(store.delete(EntityKind::Boat, 1).await.is_err());
        store.heal();
        assert_eq!(store.delete(EntityKind::Boat, 1).await, Ok(false));
    }

    #[test]
    fn test_bearer_has_prefix() {
        assert!(tokens::bearer_for("abc").starts_with("Bearer "));
    }
}
