//! Mock port implementations
//!
//! Each mock records what it was asked so tests can assert on call counts
//! and request contents.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ringrelay_core::{
    ChallengeResolver, CompareAndSwapOutcome, CredentialStore, EventStore, RingApi,
    TokenGrantClient, TokenSink,
};
use ringrelay_domain::{
    AlarmMode, BaseStation, ChallengeHint, EventRecord, EventStatus, GrantPayload, Location,
    Principal, RelayError, Result, TokenCredential, TokenResponse,
};

/// One recorded token request.
#[derive(Debug, Clone)]
pub struct RecordedGrant {
    pub payload: GrantPayload,
    pub headers: BTreeMap<String, String>,
}

/// Token endpoint double answering from a script, one entry per call.
#[derive(Default, Clone)]
pub struct ScriptedGrantClient {
    responses: Arc<Mutex<VecDeque<Result<TokenResponse>>>>,
    calls: Arc<Mutex<Vec<RecordedGrant>>>,
}

impl ScriptedGrantClient {
    pub fn new(responses: Vec<Result<TokenResponse>>) -> Self {
        Self { responses: Arc::new(Mutex::new(responses.into())), ..Self::default() }
    }

    pub fn push(&self, response: Result<TokenResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedGrant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenGrantClient for ScriptedGrantClient {
    async fn request_token(
        &self,
        payload: &GrantPayload,
        headers: &BTreeMap<String, String>,
    ) -> Result<TokenResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedGrant { payload: payload.clone(), headers: headers.clone() });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::client("unscripted token request")))
    }
}

/// In-memory credential store that records every save.
#[derive(Default, Clone)]
pub struct InMemoryCredentialStore {
    tokens: Arc<Mutex<HashMap<Principal, TokenCredential>>>,
    saves: Arc<Mutex<Vec<(Principal, TokenCredential)>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl InMemoryCredentialStore {
    pub fn with_token(principal: Principal, token: TokenCredential) -> Self {
        let store = Self::default();
        store.tokens.lock().unwrap().insert(principal, token);
        store
    }

    /// Replace the stored token without recording a save.
    pub fn put(&self, principal: Principal, token: TokenCredential) {
        self.tokens.lock().unwrap().insert(principal, token);
    }

    /// Make every subsequent `save` fail with `StoreUnavailable`.
    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    pub fn saves(&self) -> Vec<(Principal, TokenCredential)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn stored(&self, principal: &Principal) -> Option<TokenCredential> {
        self.tokens.lock().unwrap().get(principal).cloned()
    }
}

#[async_trait]
impl TokenSink for InMemoryCredentialStore {
    async fn save(&self, principal: &Principal, token: &TokenCredential) -> Result<()> {
        self.saves.lock().unwrap().push((principal.clone(), token.clone()));
        if *self.fail_saves.lock().unwrap() {
            return Err(RelayError::StoreUnavailable("credential table offline".into()));
        }
        self.tokens.lock().unwrap().insert(principal.clone(), token.clone());
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, principal: &Principal) -> Result<Option<TokenCredential>> {
        Ok(self.tokens.lock().unwrap().get(principal).cloned())
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let mut principals: Vec<_> = self.tokens.lock().unwrap().keys().cloned().collect();
        principals.sort();
        Ok(principals)
    }
}

/// Resolver returning a fixed code and counting invocations.
#[derive(Clone)]
pub struct CountingResolver {
    code: String,
    hints: Arc<Mutex<Vec<ChallengeHint>>>,
}

impl CountingResolver {
    pub fn new(code: &str) -> Self {
        Self { code: code.into(), hints: Arc::default() }
    }

    pub fn invocations(&self) -> usize {
        self.hints.lock().unwrap().len()
    }

    pub fn hints(&self) -> Vec<ChallengeHint> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChallengeResolver for CountingResolver {
    async fn resolve(&self, hint: &ChallengeHint) -> Result<String> {
        self.hints.lock().unwrap().push(hint.clone());
        Ok(self.code.clone())
    }
}

/// Event store with the same conditional-write semantics as the SQLite
/// adapter.
#[derive(Default, Clone)]
pub struct InMemoryEventStore {
    records: Arc<Mutex<HashMap<Principal, EventRecord>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl InMemoryEventStore {
    pub fn with_record(record: EventRecord) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(record.principal.clone(), record);
        store
    }

    pub fn set_unavailable(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    pub fn record(&self, principal: &Principal) -> Option<EventRecord> {
        self.records.lock().unwrap().get(principal).cloned()
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(RelayError::StoreUnavailable("event table offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn compare_and_swap(
        &self,
        principal: &Principal,
        uuid: &str,
        from: EventStatus,
        to: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<CompareAndSwapOutcome> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        match records.get_mut(principal) {
            Some(record) if record.status == from && record.uuid == uuid => {
                record.status = to;
                record.updated_at = at;
                Ok(CompareAndSwapOutcome::Applied(record.clone()))
            }
            current => Ok(CompareAndSwapOutcome::Rejected { current: current.cloned() }),
        }
    }

    async fn get(&self, principal: &Principal) -> Result<Option<EventRecord>> {
        self.check_available()?;
        Ok(self.records.lock().unwrap().get(principal).cloned())
    }

    async fn upsert(&self, record: &EventRecord) -> Result<()> {
        self.check_available()?;
        self.records.lock().unwrap().insert(record.principal.clone(), record.clone());
        Ok(())
    }
}

/// Ring API double with a fixed account layout.
#[derive(Clone)]
pub struct MockRingApi {
    locations: Vec<Location>,
    base_stations: Vec<BaseStation>,
    mode: Arc<Mutex<String>>,
    mode_changes: Arc<Mutex<Vec<AlarmMode>>>,
    tokens_seen: Arc<Mutex<Vec<String>>>,
}

impl MockRingApi {
    /// One location `loc-1` with one base station, currently `mode`.
    pub fn single_location(mode: &str) -> Self {
        Self::new(
            vec![location("loc-1")],
            vec![base_station(101, "loc-1"), base_station(202, "loc-other")],
            mode,
        )
    }

    pub fn new(locations: Vec<Location>, base_stations: Vec<BaseStation>, mode: &str) -> Self {
        Self {
            locations,
            base_stations,
            mode: Arc::new(Mutex::new(mode.into())),
            mode_changes: Arc::default(),
            tokens_seen: Arc::default(),
        }
    }

    pub fn mode_changes(&self) -> Vec<AlarmMode> {
        self.mode_changes.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    fn seen(&self, token: &TokenCredential) {
        self.tokens_seen.lock().unwrap().push(token.access_token.clone());
    }
}

pub fn location(id: &str) -> Location {
    Location { location_id: id.into(), name: Some(format!("Home {id}")) }
}

pub fn base_station(id: u64, location_id: &str) -> BaseStation {
    BaseStation {
        id,
        location_id: Some(location_id.into()),
        description: Some("Alarm Base Station".into()),
        kind: Some("base_station_v1".into()),
    }
}

#[async_trait]
impl RingApi for MockRingApi {
    async fn locations(&self, token: &TokenCredential) -> Result<Vec<Location>> {
        self.seen(token);
        Ok(self.locations.clone())
    }

    async fn base_stations(&self, token: &TokenCredential) -> Result<Vec<BaseStation>> {
        self.seen(token);
        Ok(self.base_stations.clone())
    }

    async fn location_mode(&self, token: &TokenCredential, _location_id: &str) -> Result<String> {
        self.seen(token);
        Ok(self.mode.lock().unwrap().clone())
    }

    async fn set_location_mode(
        &self,
        token: &TokenCredential,
        _location_id: &str,
        mode: AlarmMode,
    ) -> Result<String> {
        self.seen(token);
        self.mode_changes.lock().unwrap().push(mode);
        *self.mode.lock().unwrap() = mode.as_str().to_string();
        Ok(mode.as_str().to_string())
    }
}
