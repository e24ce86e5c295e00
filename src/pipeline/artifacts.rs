use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::ArtifactNames;
use crate::error::PipelineError;
use crate::types::WordTimestamp;

/// Per-entry artifact directory. Artifacts survive failed runs so a rerun can
/// resume from them.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    names: ArtifactNames,
}

impl ArtifactStore {
    pub fn new(output_dir: &Path, entry_id: &str, names: ArtifactNames) -> Self {
        Self {
            root: output_dir.join(entry_id),
            names,
        }
    }

    pub fn ensure_dir(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| PipelineError::io("create artifact directory", e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn narration(&self) -> PathBuf {
        self.root.join(&self.names.narration)
    }

    pub fn background(&self) -> PathBuf {
        self.root.join(&self.names.background)
    }

    pub fn raw_transcription(&self) -> PathBuf {
        self.root.join(&self.names.raw_transcription)
    }

    pub fn subtitles(&self) -> PathBuf {
        self.root.join(&self.names.subtitles)
    }

    pub fn final_video(&self) -> PathBuf {
        self.root.join(&self.names.final_video)
    }

    /// Where the encoder writes before the result is moved to
    /// [`final_video`](Self::final_video). Keeps the container extension.
    pub fn staging_final_video(&self) -> PathBuf {
        let name = Path::new(&self.names.final_video);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staged = match name.extension() {
            Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
            None => format!("{stem}.partial"),
        };
        self.root.join(staged)
    }
}

/// True when `path` exists and is not an empty file.
pub fn is_present(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

pub fn load_words(path: &Path) -> Result<Vec<WordTimestamp>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io("open timestamp artifact", e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PipelineError::json("parse timestamp artifact", e))
}

pub fn save_words(path: &Path, words: &[WordTimestamp]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PipelineError::io("create timestamp artifact directory", e))?;
    }
    let mut file =
        File::create(path).map_err(|e| PipelineError::io("create timestamp artifact", e))?;
    serde_json::to_writer_pretty(&mut file, words)
        .map_err(|e| PipelineError::json("serialize timestamp artifact", e))?;
    file.write_all(b"\n")
        .map_err(|e| PipelineError::io("finalize timestamp artifact", e))?;
    Ok(())
}
