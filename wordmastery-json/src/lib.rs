use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, info};
use wordmastery_core::{
    mastery,
    repo::{validate_ids, Repository},
    CoreError, MasteryPolicy, ReviewApplied, ReviewEvent, ReviewOutcome, UserId, WordId,
    WordReviewRecord,
};

pub mod paths;

const FILE_VERSION: u32 = 1;

type Key = (UserId, WordId);

#[derive(Clone, Serialize, Deserialize)]
struct StoredRecord {
    user_id: UserId,
    record: WordReviewRecord,
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredEvent {
    user_id: UserId,
    event: ReviewEvent,
}

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    records: Vec<StoredRecord>,
    events: Vec<StoredEvent>,
}

#[derive(Default, Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    records: HashMap<Key, WordReviewRecord>,
    events: HashMap<Key, Vec<ReviewEvent>>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            records: HashMap::new(),
            events: HashMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            records: self
                .records
                .iter()
                .map(|((uid, _), r)| StoredRecord {
                    user_id: uid.clone(),
                    record: r.clone(),
                })
                .collect(),
            events: self
                .events
                .iter()
                .flat_map(|((uid, _), evs)| {
                    evs.iter().map(|e| StoredEvent {
                        user_id: uid.clone(),
                        event: e.clone(),
                    })
                })
                .collect(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let mut records = HashMap::new();
        for sr in img.records {
            let k = (sr.user_id, sr.record.word_id.clone());
            records.insert(k, sr.record);
        }
        let mut events: HashMap<Key, Vec<ReviewEvent>> = HashMap::new();
        for se in img.events {
            let k = (se.user_id, se.event.word_id.clone());
            events.entry(k).or_default().push(se.event);
        }
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            records,
            events,
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    policy: MasteryPolicy,
    state: RwLock<State>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let (state, fresh) = load_or_init(&path).await?;
        let store = Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            policy: MasteryPolicy::default(),
            state: RwLock::new(state),
        };
        if fresh {
            store.save().await?;
        }
        Ok(store)
    }

    pub fn with_policy(mut self, policy: MasteryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn save(&self) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        debug!(
            records = snapshot.records.len(),
            events = snapshot.events.len(),
            "persisting snapshot"
        );
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path) -> Result<(State, bool), CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("io")))?;
        let mut st = State::from_image(img);
        st.updated_at = Utc::now();
        info!(
            records = st.records.len(),
            path = %path.display(),
            "loaded review store"
        );
        Ok((st, false))
    } else {
        info!(path = %path.display(), "creating new review store");
        Ok((State::new_empty(), true))
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img).expect("serialize");
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    let _ = fs::remove_file(path);
    tmp.persist(path)?;

    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_path = backups_dir.join(format!("wordmastery-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    let _ = fs::remove_file(&backup_path);
    btmp.persist(&backup_path)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

fn key(user_id: &str, word_id: &str) -> Key {
    (user_id.to_string(), word_id.to_string())
}

#[async_trait]
impl Repository for JsonStore {
    async fn get_record(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<WordReviewRecord, CoreError> {
        self.state
            .read()
            .records
            .get(&key(user_id, word_id))
            .cloned()
            .ok_or(CoreError::NotFound("record"))
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<WordReviewRecord>, CoreError> {
        Ok(self
            .state
            .read()
            .records
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn record_review(
        &self,
        user_id: &str,
        word_id: &str,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ReviewApplied, CoreError> {
        validate_ids(user_id, word_id)?;
        let k = key(user_id, word_id);
        let applied = {
            // Write lock held across the read-modify-write so concurrent
            // reviews of the same word cannot lose an update.
            let mut s = self.state.write();
            let current = s.records.get(&k).cloned();
            let applied = mastery::apply_and_schedule(current, word_id, outcome, now, &self.policy);
            s.records.insert(k.clone(), applied.record.clone());
            s.events.entry(k).or_default().push(applied.event.clone());
            applied
        };
        self.save().await?;
        Ok(applied)
    }

    async fn reset_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<WordReviewRecord, CoreError> {
        validate_ids(user_id, word_id)?;
        let fresh = WordReviewRecord::new(word_id);
        {
            let mut s = self.state.write();
            s.records.insert(key(user_id, word_id), fresh.clone());
        }
        self.save().await?;
        Ok(fresh)
    }

    async fn list_events(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Vec<ReviewEvent>, CoreError> {
        Ok(self
            .state
            .read()
            .events
            .get(&key(user_id, word_id))
            .cloned()
            .unwrap_or_default())
    }
}
