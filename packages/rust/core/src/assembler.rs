//! Output directory assembler.
//!
//! Writes rendered artifacts into the output directory and records their checksums in
//! the snapshot manifest. A run's files are staged as temp files and swapped in as one
//! batch, so the directory holds either the whole new output or the old one.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use docbind_shared::{ArtifactMeta, CURRENT_SCHEMA_VERSION, DocbindError, Result, SnapshotManifest};

/// Provenance of one run, used to build the manifest.
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    pub source_url: String,
    pub tool_version: String,
    pub input_sha256: Option<String>,
    pub type_count: usize,
    pub operation_count: usize,
}

/// Write each `(filename, content)` pair into `dir` as one batch.
#[instrument(skip_all, fields(dir = %dir.display(), artifact_count = artifacts.len()))]
pub fn write_artifacts(dir: &Path, artifacts: &[(&str, &str)]) -> Result<Vec<ArtifactMeta>> {
    write_batch(dir, artifacts)?;

    let metas: Vec<ArtifactMeta> = artifacts
        .iter()
        .map(|(filename, content)| artifact_meta(filename, content))
        .collect();

    info!(count = metas.len(), "artifacts written");
    Ok(metas)
}

/// Checksum and size of one artifact's content.
pub fn artifact_meta(filename: &str, content: &str) -> ArtifactMeta {
    ArtifactMeta {
        filename: filename.to_string(),
        sha256: sha256_hex(content.as_bytes()),
        size_bytes: content.len(),
    }
}

/// Write every file or none of them.
///
/// All contents are staged as temp files first. Targets are then swapped in one by one,
/// keeping the previous file as a backup until the whole batch is in place; a failed swap
/// puts every earlier target back.
pub fn write_batch(dir: &Path, files: &[(&str, &str)]) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| DocbindError::io(dir, e))?;

    let staged = stage(dir, files)?;

    if let Some(blocked) = staged.iter().find(|s| s.target.is_dir()) {
        discard(&staged);
        return Err(DocbindError::io(
            &blocked.target,
            std::io::Error::new(std::io::ErrorKind::IsADirectory, "target is a directory"),
        ));
    }

    for (i, file) in staged.iter().enumerate() {
        if let Err(e) = file.commit() {
            staged[..i].iter().rev().for_each(StagedFile::rollback);
            discard(&staged[i..]);
            return Err(e);
        }
    }

    for file in &staged {
        let _ = std::fs::remove_file(&file.backup);
        debug!(path = %file.target.display(), "wrote artifact");
    }
    Ok(())
}

struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    backup: PathBuf,
}

impl StagedFile {
    fn new(dir: &Path, filename: &str) -> Self {
        Self {
            temp: dir.join(format!(".{filename}.tmp")),
            target: dir.join(filename),
            backup: dir.join(format!(".{filename}.bak")),
        }
    }

    /// Move the current target aside, then the temp file into place.
    fn commit(&self) -> Result<()> {
        let _ = std::fs::remove_file(&self.backup);
        if self.target.exists() {
            std::fs::rename(&self.target, &self.backup).map_err(|e| DocbindError::io(&self.target, e))?;
        }
        if let Err(e) = std::fs::rename(&self.temp, &self.target) {
            if self.backup.exists() {
                let _ = std::fs::rename(&self.backup, &self.target);
            }
            return Err(DocbindError::io(&self.target, e));
        }
        Ok(())
    }

    /// Undo a successful `commit`.
    fn rollback(&self) {
        if self.backup.exists() {
            let _ = std::fs::rename(&self.backup, &self.target);
        } else {
            let _ = std::fs::remove_file(&self.target);
        }
    }
}

fn stage(dir: &Path, files: &[(&str, &str)]) -> Result<Vec<StagedFile>> {
    let mut staged = Vec::with_capacity(files.len());
    for (filename, content) in files {
        let file = StagedFile::new(dir, filename);
        if let Err(e) = std::fs::write(&file.temp, content) {
            discard(&staged);
            return Err(DocbindError::io(&file.temp, e));
        }
        staged.push(file);
    }
    Ok(staged)
}

fn discard(staged: &[StagedFile]) {
    for file in staged {
        let _ = std::fs::remove_file(&file.temp);
    }
}

/// Build the manifest for artifacts that were just written.
pub fn build_manifest(info: &ManifestInfo, artifacts: Vec<ArtifactMeta>) -> SnapshotManifest {
    SnapshotManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        source_url: info.source_url.clone(),
        tool_version: info.tool_version.clone(),
        generated_at: Utc::now(),
        input_sha256: info.input_sha256.clone(),
        type_count: info.type_count,
        operation_count: info.operation_count,
        artifacts,
    }
}

/// Serialize `manifest` as pretty JSON.
pub fn render_manifest(manifest: &SnapshotManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest)
        .map_err(|e| DocbindError::validation(format!("JSON serialization failed: {e}")))
}

/// Write `manifest` as pretty JSON to `dir/filename`.
pub fn write_manifest(dir: &Path, filename: &str, manifest: &SnapshotManifest) -> Result<()> {
    let json = render_manifest(manifest)?;
    write_batch(dir, &[(filename, &json)])?;
    debug!(path = %dir.join(filename).display(), "wrote manifest");
    Ok(())
}

/// Read and validate a manifest.
pub fn read_manifest(path: &Path) -> Result<SnapshotManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| DocbindError::io(path, e))?;
    let manifest: SnapshotManifest = serde_json::from_str(&content)
        .map_err(|e| DocbindError::validation(format!("invalid manifest {}: {e}", path.display())))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(DocbindError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(manifest)
}

/// Lowercase hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
