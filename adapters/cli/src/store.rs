//! File-backed collaborators: a directory of level JSON files and an
//! append-only JSON-lines score log.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use uptime_defence_core::level::Level;
use uptime_defence_session::{LevelStore, ScoreSubmission, ScoreSubmitter, StoreError, SubmitError};

/// Level store keeping one `<id>.json` file per level in a directory.
#[derive(Clone, Debug)]
pub(crate) struct DirectoryLevelStore {
    root: PathBuf,
}

impl DirectoryLevelStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub(crate) fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: u32) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

fn backend(error: impl std::error::Error + Send + Sync + 'static) -> StoreError {
    StoreError::Backend(Box::new(error))
}

impl LevelStore for DirectoryLevelStore {
    fn load(&self, id: u32) -> Result<Level, StoreError> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id })
            }
            Err(error) => return Err(backend(error)),
        };
        let mut level: Level = serde_json::from_slice(&bytes).map_err(backend)?;
        level.id = id;
        level
            .validate()
            .map_err(|source| StoreError::Invalid { id, source })?;
        Ok(level)
    }

    fn save(&mut self, level: &Level) -> Result<(), StoreError> {
        level.validate().map_err(|source| StoreError::Invalid {
            id: level.id,
            source,
        })?;
        let json = serde_json::to_vec_pretty(level).map_err(backend)?;
        fs::write(self.path_for(level.id), json).map_err(backend)
    }

    fn list(&self) -> Result<Vec<u32>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(backend)? {
            let path = entry.map_err(backend)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Score submitter appending one JSON object per line to a file.
#[derive(Clone, Debug)]
pub(crate) struct ScoreLog {
    path: PathBuf,
}

impl ScoreLog {
    pub(crate) fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ScoreSubmitter for ScoreLog {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        if submission.player_id.trim().is_empty() {
            return Err(SubmitError::Rejected("missing player id".to_owned()));
        }
        let mut line =
            serde_json::to_string(submission).map_err(|error| SubmitError::Backend(Box::new(error)))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|error| SubmitError::Backend(Box::new(error)))?;
        file.write_all(line.as_bytes())
            .map_err(|error| SubmitError::Backend(Box::new(error)))
    }
}
