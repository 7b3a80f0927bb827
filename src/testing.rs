//! In-memory stand-ins for the service traits.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::config::{AppConfig, ConfigUpdate};
use crate::context::AppContext;
use crate::domain::revision::RevisionRef;
use crate::error::{AppError, AppResult};
use crate::notifier::Notifier;
use crate::services::{ConfigStore, Notification, NotificationSink, RemoteStateService};

pub enum Scripted<T> {
    Found(T),
    Missing,
    Unavailable,
}

impl<T: Clone> Scripted<T> {
    fn resolve(&self) -> AppResult<Option<T>> {
        match self {
            Scripted::Found(value) => Ok(Some(value.clone())),
            Scripted::Missing => Ok(None),
            Scripted::Unavailable => Err(AppError::RemoteUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Serves scripted revisions in order, repeating the last one.
pub struct FakeRemote {
    revisions: Mutex<VecDeque<Scripted<RevisionRef>>>,
    content: Mutex<Scripted<String>>,
    pub revision_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            revisions: Mutex::new(VecDeque::new()),
            content: Mutex::new(Scripted::Missing),
            revision_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_revisions(self, ids: &[&str]) -> Self {
        self.push_revisions(ids.iter().map(|id| Scripted::Found(RevisionRef::new(*id))));
        self
    }

    pub fn with_content(self, text: &str) -> Self {
        self.set_content(Scripted::Found(text.to_string()));
        self
    }

    pub fn push_revisions(&self, scripted: impl IntoIterator<Item = Scripted<RevisionRef>>) {
        self.revisions.lock().unwrap().extend(scripted);
    }

    pub fn set_content(&self, content: Scripted<String>) {
        *self.content.lock().unwrap() = content;
    }
}

#[async_trait]
impl RemoteStateService for FakeRemote {
    async fn fetch_latest_revision(&self) -> AppResult<Option<RevisionRef>> {
        self.revision_calls.fetch_add(1, Ordering::SeqCst);
        let mut revisions = self.revisions.lock().unwrap();
        if revisions.len() > 1 {
            let next = revisions.pop_front().unwrap();
            return next.resolve();
        }
        match revisions.front() {
            Some(last) => last.resolve(),
            None => Ok(None),
        }
    }

    async fn fetch_file_content(&self) -> AppResult<Option<String>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.content.lock().unwrap().resolve()
    }

    fn history_url(&self) -> String {
        "https://github.com/acme/widgets/commits/HEAD/CHANGELOG.md".to_string()
    }
}

#[derive(Default)]
pub struct MemoryConfigStore {
    config: Mutex<AppConfig>,
    pub updates: AtomicUsize,
    pub fail_updates: AtomicBool,
}

impl MemoryConfigStore {
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Mutex::new(config),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> AppConfig {
        self.config.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> AppResult<AppConfig> {
        Ok(self.snapshot())
    }

    async fn update(&self, update: ConfigUpdate) -> AppResult<AppConfig> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Configuration("disk full".to_string()));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut config = self.config.lock().unwrap();
        config.merge(update)?;
        Ok(config.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn show(&self, notification: &Notification) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Notification("notifier crashed".to_string()));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct Harness {
    pub remote: Arc<FakeRemote>,
    pub store: Arc<MemoryConfigStore>,
    pub sink: Arc<RecordingSink>,
    pub ctx: AppContext,
}

impl Harness {
    pub fn new(remote: FakeRemote, config: AppConfig) -> Self {
        let remote = Arc::new(remote);
        let store = Arc::new(MemoryConfigStore::with_config(config.clone()));
        let sink = Arc::new(RecordingSink::default());
        let notifier = Arc::new(Notifier::new(sink.clone(), config.notification.sound_enabled));
        let ctx = AppContext::new(remote.clone(), store.clone(), notifier);
        Self {
            remote,
            store,
            sink,
            ctx,
        }
    }
}
