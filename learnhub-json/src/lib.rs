use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learnhub_core::{Certificate, CoreError, CourseId, SessionState, SessionStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

pub mod paths;

const FILE_VERSION: u32 = 1;
const DEFAULT_BACKUPS: usize = 5;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    paid_courses: Vec<CourseId>,
    #[serde(default)]
    certificates: Vec<Certificate>,
}

impl FileImage {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            version: FILE_VERSION,
            created_at: now,
            updated_at: now,
            paid_courses: Vec::new(),
            certificates: Vec::new(),
        }
    }

    fn state(&self) -> SessionState {
        SessionState {
            paid_courses: self.paid_courses.clone(),
            certificates: self.certificates.clone(),
        }
    }
}

/// Session state persisted as a single JSON document holding the paid-course
/// and certificate arrays.
pub struct JsonSessionStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    image: RwLock<FileImage>,
}

impl JsonSessionStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_session_file();
        Self::open_with(file, backups, DEFAULT_BACKUPS).await
    }

    pub async fn open(path: PathBuf) -> Result<Self, CoreError> {
        let backups = path.with_extension("backups");
        Self::open_with(path, backups, DEFAULT_BACKUPS).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let image = load_or_init(&path).await?;
        tracing::debug!(path = %path.display(), "session file opened");
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            image: RwLock::new(image),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
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

async fn load_or_init(path: &Path) -> Result<FileImage, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("corrupt session file")))?;
        Ok(img)
    } else {
        let img = FileImage::new_empty();
        write_atomic(path, &img).map_err(|_| CoreError::Storage("io"))?;
        Ok(img)
    }
}

fn write_atomic(path: &Path, img: &FileImage) -> Result<Vec<u8>, std::io::Error> {
    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(json)
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;
    let json = write_atomic(path, img)?;

    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("session-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn load(&self) -> Result<SessionState, CoreError> {
        Ok(self.image.read().state())
    }

    async fn save(&self, state: &SessionState) -> Result<(), CoreError> {
        let img = {
            let mut g = self.image.write();
            g.paid_courses = state.paid_courses.clone();
            g.certificates = state.certificates.clone();
            g.updated_at = Utc::now();
            g.clone()
        };

        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &img))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                tracing::error!(error = %e, "session file write failed");
                CoreError::Storage("io")
            })
    }
}
