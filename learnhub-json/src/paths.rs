use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "learnhub", "LearnHub") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn default_session_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    let file = root.join("session.json");
    let backups = root.join("backups");
    (file, backups)
}
