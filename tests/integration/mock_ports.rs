//! Mock port adapters for integration tests.
//!
//! Every mock records its calls behind an `Arc<Mutex<_>>` so a test can
//! keep a clone for assertions after handing the mock to a component.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use webthing_node::app::credentials::NetworkCredentials;
use webthing_node::app::events::AppEvent;
use webthing_node::app::ports::{
    ClockPort, EventSink, KeyValueStore, NameAdvertiser, ProvisioningPortal, RadioError,
    RadioPort, ResetInput, ServiceError, StorageError, SystemPort, ThingServerPort, TimeSyncPort,
};
use webthing_node::things::ThingHandle;

// ── Key-value store ───────────────────────────────────────────

#[derive(Default)]
pub struct StoreState {
    pub committed: HashMap<String, String>,
    pub staged: Vec<(String, Option<String>)>,
    pub removes: u32,
    pub commits: u32,
    pub fail_remove: bool,
    pub fail_commit: bool,
}

#[derive(Clone, Default)]
pub struct MockStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl MockStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut s = store.state.lock().unwrap();
            for (k, v) in entries {
                s.committed.insert((*k).into(), (*v).into());
            }
        }
        store
    }

    pub fn credentials(ssid: &str, pass: &str, host: &str) -> Self {
        Self::with(&[("ssid", ssid), ("pass", pass), ("mdns_host", host)])
    }

    pub fn removes(&self) -> u32 {
        self.state.lock().unwrap().removes
    }

    pub fn commits(&self) -> u32 {
        self.state.lock().unwrap().commits
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().committed.is_empty()
    }
}

impl KeyValueStore for MockStore {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state.lock().unwrap().committed.get(key).cloned())
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .staged
            .push((key.into(), Some(value.into())));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        let mut s = self.state.lock().unwrap();
        s.removes += 1;
        if s.fail_remove {
            return Err(StorageError::WriteFailed);
        }
        let existed = s.committed.contains_key(key);
        s.staged.push((key.into(), None));
        Ok(existed)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        let mut s = self.state.lock().unwrap();
        s.commits += 1;
        if s.fail_commit {
            s.staged.clear();
            return Err(StorageError::CommitFailed);
        }
        let staged = std::mem::take(&mut s.staged);
        for (k, v) in staged {
            match v {
                Some(v) => s.committed.insert(k, v),
                None => s.committed.remove(&k),
            };
        }
        Ok(())
    }
}

// ── Radio ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    StartStation(String),
    StartAccessPoint(String),
    Connect,
    Stop,
}

#[derive(Clone, Default)]
pub struct MockRadio {
    pub calls: Arc<Mutex<Vec<RadioCall>>>,
    pub fail_start: Arc<AtomicBool>,
}

impl MockRadio {
    /// A radio whose station and access-point start both fail.
    pub fn failing() -> Self {
        let radio = Self::default();
        radio.fail_start.store(true, Ordering::SeqCst);
        radio
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == RadioCall::Connect)
            .count()
    }
}

impl RadioPort for MockRadio {
    fn start_station(&self, credentials: &NetworkCredentials) -> Result<(), RadioError> {
        self.calls
            .lock()
            .unwrap()
            .push(RadioCall::StartStation(credentials.ssid().into()));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RadioError::Driver(-1));
        }
        Ok(())
    }

    fn start_access_point(&self, ssid: &str) -> Result<(), RadioError> {
        self.calls
            .lock()
            .unwrap()
            .push(RadioCall::StartAccessPoint(ssid.into()));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RadioError::Driver(-1));
        }
        Ok(())
    }

    fn connect(&self) -> Result<(), RadioError> {
        self.calls.lock().unwrap().push(RadioCall::Connect);
        Ok(())
    }

    fn stop(&self) -> Result<(), RadioError> {
        self.calls.lock().unwrap().push(RadioCall::Stop);
        Ok(())
    }
}

// ── Network services ──────────────────────────────────────────

#[derive(Default)]
pub struct ServiceLog {
    pub server_starts: Vec<(u16, String, String)>,
    pub advertisements: Vec<(Option<String>, bool, u16)>,
    pub time_syncs: Vec<String>,
    pub things: usize,
    pub portal_starts: u32,
}

#[derive(Clone, Default)]
pub struct MockServices {
    pub log: Arc<Mutex<ServiceLog>>,
}

impl MockServices {
    pub fn server_starts(&self) -> usize {
        self.log.lock().unwrap().server_starts.len()
    }

    pub fn advertisements(&self) -> Vec<(Option<String>, bool, u16)> {
        self.log.lock().unwrap().advertisements.clone()
    }

    pub fn time_syncs(&self) -> usize {
        self.log.lock().unwrap().time_syncs.len()
    }

    pub fn portal_starts(&self) -> u32 {
        self.log.lock().unwrap().portal_starts
    }
}

impl ThingServerPort for MockServices {
    fn init_root_node(&mut self) {}

    fn register_thing(&mut self, _thing: ThingHandle) -> Result<(), ServiceError> {
        self.log.lock().unwrap().things += 1;
        Ok(())
    }

    fn start_server(&mut self, port: u16, hostname: &str, domain: &str) -> Result<(), ServiceError> {
        self.log
            .lock()
            .unwrap()
            .server_starts
            .push((port, hostname.into(), domain.into()));
        Ok(())
    }
}

impl NameAdvertiser for MockServices {
    fn advertise(
        &mut self,
        hostname: Option<&str>,
        access_point: bool,
        port: u16,
    ) -> Result<(), ServiceError> {
        self.log
            .lock()
            .unwrap()
            .advertisements
            .push((hostname.map(Into::into), access_point, port));
        Ok(())
    }
}

impl TimeSyncPort for MockServices {
    fn start(&mut self, server: &str) -> Result<(), ServiceError> {
        self.log.lock().unwrap().time_syncs.push(server.into());
        Ok(())
    }
}

impl ProvisioningPortal for MockServices {
    fn start(&mut self) -> Result<(), ServiceError> {
        self.log.lock().unwrap().portal_starts += 1;
        Ok(())
    }
}

// ── System / clock ────────────────────────────────────────────

#[derive(Clone)]
pub struct MockSystem {
    pub free_heap: Arc<AtomicU32>,
    pub restarts: Arc<AtomicU32>,
}

impl Default for MockSystem {
    fn default() -> Self {
        Self {
            free_heap: Arc::new(AtomicU32::new(150_000)),
            restarts: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl MockSystem {
    pub fn set_free_heap(&self, bytes: u32) {
        self.free_heap.store(bytes, Ordering::Relaxed);
    }

    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }
}

impl SystemPort for MockSystem {
    fn free_heap(&self) -> u32 {
        self.free_heap.load(Ordering::Relaxed)
    }

    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Default)]
pub struct MockClock {
    pub timezone_sets: Arc<Mutex<Vec<String>>>,
}

impl ClockPort for MockClock {
    fn set_timezone(&mut self, tz: &str) {
        self.timezone_sets.lock().unwrap().push(tz.into());
    }

    fn local_timestamp(&self) -> String {
        "2024/05/01 12:00:00".into()
    }
}

// ── Reset input ───────────────────────────────────────────────

/// Button held for a fixed duration from construction.
pub struct HeldButton {
    pressed_at: Instant,
    hold: Duration,
    pub rearms: u32,
}

impl HeldButton {
    pub fn held_for(hold: Duration) -> Self {
        Self {
            pressed_at: Instant::now(),
            hold,
            rearms: 0,
        }
    }
}

impl ResetInput for HeldButton {
    fn is_asserted(&mut self) -> bool {
        self.pressed_at.elapsed() < self.hold
    }

    fn rearm(&mut self) {
        self.rearms += 1;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
