//! Proposal persistence.
//!
//! [`ProposalRepository`] is the remote side that confirms drops and stores
//! generated plans. Every call goes through a [`RetryPolicy`]; running out of
//! attempts yields a [`PersistenceError`] and the caller recovers locally.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;

use crate::error::PersistenceError;
use crate::scheduler::Proposal;

/// Stores proposals by stable id. Last writer wins.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn create(&self, proposal: &Proposal) -> Result<(), PersistenceError>;

    /// Fails with [`PersistenceError::NotFound`] for unknown ids.
    async fn update(&self, proposal: &Proposal) -> Result<(), PersistenceError>;

    async fn delete(&self, id: &str) -> Result<(), PersistenceError>;

    /// Proposals assigned to `date`, sorted by start.
    async fn list(&self, date: NaiveDate) -> Result<Vec<Proposal>, PersistenceError>;
}

/// Bounded retry with a per-attempt timeout and fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            timeout: Duration::from_secs(10),
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails definitively, or attempts run out.
    ///
    /// Timeouts and storage failures are retried. A rejection or an unknown
    /// id is final and returned immediately.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, PersistenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PersistenceError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::warn!(what, attempt, backoff_ms = self.backoff.as_millis() as u64, "retrying");
                tokio::time::sleep(self.backoff).await;
            }

            let error = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e @ (PersistenceError::Rejected(_) | PersistenceError::NotFound(_)))) => {
                    return Err(e)
                }
                Ok(Err(e)) => e,
                Err(_) => PersistenceError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                    attempts: attempt,
                },
            };
            tracing::debug!(what, attempt, error = %error, "attempt failed");
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| PersistenceError::Storage(format!("{what}: no attempt made"))))
    }
}

/// Repository held in memory. Failure can be switched on to exercise
/// rollback paths.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    proposals: Mutex<BTreeMap<String, Proposal>>,
    failure: Mutex<Option<PersistenceError>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proposals(proposals: impl IntoIterator<Item = Proposal>) -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.proposals.lock() {
            for proposal in proposals {
                map.insert(proposal.stable_id.clone(), proposal);
            }
        }
        repo
    }

    /// Make every following call fail with `error`, or succeed again with `None`.
    pub fn fail_with(&self, error: Option<PersistenceError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    /// Never answer (until the policy times out).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Proposal> {
        self.proposals
            .lock()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn enter(&self) -> Result<(), PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_map<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Proposal>) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut map = self
            .proposals
            .lock()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        f(&mut map)
    }
}

#[async_trait]
impl ProposalRepository for InMemoryRepository {
    async fn create(&self, proposal: &Proposal) -> Result<(), PersistenceError> {
        self.enter().await?;
        self.with_map(|map| {
            map.insert(proposal.stable_id.clone(), proposal.clone());
            Ok(())
        })
    }

    async fn update(&self, proposal: &Proposal) -> Result<(), PersistenceError> {
        self.enter().await?;
        self.with_map(|map| match map.get_mut(&proposal.stable_id) {
            Some(existing) => {
                *existing = proposal.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(proposal.stable_id.clone())),
        })
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.enter().await?;
        self.with_map(|map| {
            map.remove(id)
                .map(|_| ())
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
        })
    }

    async fn list(&self, date: NaiveDate) -> Result<Vec<Proposal>, PersistenceError> {
        self.enter().await?;
        self.with_map(|map| Ok(for_date(map.values(), date)))
    }
}

/// Repository backed by one JSON document on disk.
///
/// File access goes through `tokio::fs`, so a [`RetryPolicy`] timeout can
/// abandon a slow read or write at its next await point.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `proposals.json` inside the data directory.
    pub fn open_default() -> Result<Self, crate::error::CoreError> {
        Ok(Self::new(crate::storage::data_dir()?.join("proposals.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove every proposal of `date`. Returns how many were removed.
    pub async fn clear_date(&self, date: NaiveDate) -> Result<usize, PersistenceError> {
        self.transact(|map| {
            let before = map.len();
            map.retain(|_, p| p.assigned_date != date);
            Ok(before - map.len())
        })
        .await
    }

    async fn load(&self) -> Result<BTreeMap<String, Proposal>, PersistenceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let proposals: Vec<Proposal> = serde_json::from_str(&content)?;
        Ok(proposals
            .into_iter()
            .map(|p| (p.stable_id.clone(), p))
            .collect())
    }

    async fn persist(&self, map: &BTreeMap<String, Proposal>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let proposals: Vec<&Proposal> = map.values().collect();
        let data = serde_json::to_string_pretty(&proposals)?;
        fs::write(&self.path, data).await?;
        tracing::debug!(path = %self.path.display(), count = proposals.len(), "proposals written");
        Ok(())
    }

    async fn transact<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut BTreeMap<String, Proposal>) -> Result<T, PersistenceError> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        let value = f(&mut map)?;
        self.persist(&map).await?;
        Ok(value)
    }
}

#[async_trait]
impl ProposalRepository for JsonFileRepository {
    async fn create(&self, proposal: &Proposal) -> Result<(), PersistenceError> {
        self.transact(|map| {
            map.insert(proposal.stable_id.clone(), proposal.clone());
            Ok(())
        })
        .await
    }

    async fn update(&self, proposal: &Proposal) -> Result<(), PersistenceError> {
        self.transact(|map| match map.get_mut(&proposal.stable_id) {
            Some(existing) => {
                *existing = proposal.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(proposal.stable_id.clone())),
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.transact(|map| {
            map.remove(id)
                .map(|_| ())
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
        })
        .await
    }

    async fn list(&self, date: NaiveDate) -> Result<Vec<Proposal>, PersistenceError> {
        let _guard = self.lock.lock().await;
        let map = self.load().await?;
        Ok(for_date(map.values(), date))
    }
}

fn for_date<'a>(proposals: impl Iterator<Item = &'a Proposal>, date: NaiveDate) -> Vec<Proposal> {
    let mut found: Vec<Proposal> = proposals
        .filter(|p| p.assigned_date == date)
        .cloned()
        .collect();
    found.sort_by(|a, b| {
        a.assigned_start
            .cmp(&b.assigned_start)
            .then_with(|| a.stable_id.cmp(&b.stable_id))
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn proposal(id: &str, start: u32) -> Proposal {
        Proposal::manual(id, "Task", date(), start, start + 30).unwrap()
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            timeout: Duration::from_millis(50),
            backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_in_memory_crud() {
        let repo = InMemoryRepository::new();
        repo.create(&proposal("b", 600)).await.unwrap();
        repo.create(&proposal("a", 540)).await.unwrap();

        let listed = repo.list(date()).await.unwrap();
        assert_eq!(listed.iter().map(|p| p.stable_id.as_str()).collect::<Vec<_>>(), ["a", "b"]);

        let mut moved = proposal("a", 700);
        moved.task_name = "Moved".into();
        repo.update(&moved).await.unwrap();
        assert_eq!(repo.list(date()).await.unwrap()[1].task_name, "Moved");

        repo.delete("a").await.unwrap();
        assert_eq!(repo.delete("a").await, Err(PersistenceError::NotFound("a".into())));
        assert_eq!(repo.calls(), 7);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.update(&proposal("x", 540)).await.unwrap_err();
        assert_eq!(err, PersistenceError::NotFound("x".into()));
    }

    #[tokio::test]
    async fn test_switchable_failure() {
        let repo = InMemoryRepository::with_proposals([proposal("a", 540)]);
        repo.fail_with(Some(PersistenceError::Rejected("conflict".into())));
        assert!(repo.update(&proposal("a", 600)).await.is_err());
        repo.fail_with(None);
        repo.update(&proposal("a", 600)).await.unwrap();
        assert_eq!(repo.snapshot()[0].assigned_start, 600);
    }

    #[tokio::test]
    async fn test_policy_times_out_after_all_attempts() {
        let repo = InMemoryRepository::with_proposals([proposal("a", 540)]);
        repo.set_offline(true);
        let moved = proposal("a", 600);
        let err = quick_policy()
            .run("update", || repo.update(&moved))
            .await
            .unwrap_err();
        assert_eq!(err, PersistenceError::Timeout { timeout_ms: 50, attempts: 2 });
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn test_policy_does_not_retry_rejection() {
        let repo = InMemoryRepository::with_proposals([proposal("a", 540)]);
        repo.fail_with(Some(PersistenceError::Rejected("locked".into())));
        let moved = proposal("a", 600);
        let err = quick_policy()
            .run("update", || repo.update(&moved))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Rejected(_)));
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn test_policy_retries_transient_failure() {
        let attempts = AtomicU32::new(0);
        let value = quick_policy()
            .run("flaky", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(PersistenceError::Storage("disk busy".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_json_file_repository_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("proposals.json");

        let repo = JsonFileRepository::new(&path);
        repo.create(&proposal("a", 540)).await.unwrap();
        repo.create(&proposal("b", 480)).await.unwrap();
        assert!(path.exists());

        let reopened = JsonFileRepository::new(&path);
        let listed = reopened.list(date()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].stable_id, "b");

        let other_day = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert!(reopened.list(other_day).await.unwrap().is_empty());

        assert_eq!(reopened.clear_date(date()).await.unwrap(), 2);
        assert!(reopened.list(date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("none.json"));
        assert!(repo.list(date()).await.unwrap().is_empty());
        assert!(matches!(
            repo.update(&proposal("a", 540)).await,
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_json_file_times_out_while_locked() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("proposals.json"));
        repo.create(&proposal("a", 540)).await.unwrap();

        let _held = repo.lock.lock().await;
        let moved = proposal("a", 600);
        let err = quick_policy()
            .run("update", || repo.update(&moved))
            .await
            .unwrap_err();
        assert_eq!(err, PersistenceError::Timeout { timeout_ms: 50, attempts: 2 });
    }

    #[tokio::test]
    async fn test_json_file_corrupt_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proposals.json");
        std::fs::write(&path, "not json").unwrap();
        let repo = JsonFileRepository::new(&path);
        assert!(matches!(repo.list(date()).await, Err(PersistenceError::Storage(_))));
    }
}
