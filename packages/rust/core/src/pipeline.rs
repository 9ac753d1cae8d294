//! End-to-end pipelines: `generate` (HTML → registries → artifacts) and `regenerate`
//! (frozen snapshot → artifacts).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use url::Url;

use docbind_codegen::{Artifacts, EmitOptions};
use docbind_fetch::FetchOptions;
use docbind_html::Document;
use docbind_shared::{DocbindError, OutputConfig, Registries, Result, ScrapeConfig, SnapshotManifest};

use crate::assembler::{self, ManifestInfo};

/// Where the reference HTML comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Url(Url),
    File(PathBuf),
}

impl InputSource {
    /// Recorded as the manifest's `source_url`.
    pub fn describe(&self) -> String {
        match self {
            InputSource::Url(url) => url.to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// Configuration for the `generate` pipeline.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub input: InputSource,
    pub fetch: FetchOptions,
    pub scrape: ScrapeConfig,
    /// Artifact filenames and binding names.
    pub output: OutputConfig,
    /// Directory the artifacts are written to.
    pub out_dir: PathBuf,
    /// Tool version string.
    pub tool_version: String,
}

/// Configuration for the `regenerate` pipeline.
#[derive(Debug, Clone)]
pub struct RegenerateConfig {
    /// Directory holding the frozen dumps.
    pub snapshot_dir: PathBuf,
    pub output: OutputConfig,
    pub out_dir: PathBuf,
    pub tool_version: String,
}

/// Result of either pipeline.
#[derive(Debug)]
pub struct GenerateResult {
    pub out_dir: PathBuf,
    pub type_count: usize,
    pub operation_count: usize,
    pub manifest: SnapshotManifest,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Run the full `generate` pipeline.
///
/// 1. Read the HTML (fetch or local file)
/// 2. Parse, segment and classify (pass one)
/// 3. Resolve references (pass two)
/// 4. Render all artifacts in memory
/// 5. Write artifacts and the manifest as one batch
///
/// Nothing is written unless every earlier step succeeded.
#[instrument(skip_all, fields(source = %config.input.describe(), out = %config.out_dir.display()))]
pub async fn generate(config: &GenerateConfig, progress: &dyn ProgressReporter) -> Result<GenerateResult> {
    let start = Instant::now();
    info!("starting generate pipeline");

    // --- Phase 1: Input ---
    progress.phase("Reading reference page");
    let html = read_input(&config.input, &config.fetch).await?;
    let input_sha256 = assembler::sha256_hex(html.as_bytes());

    // --- Phase 2: Scrape ---
    progress.phase("Scraping entries");
    let registries = scrape_html(&html, &config.scrape)?;
    if registries.types.is_empty() && registries.operations.is_empty() {
        warn!("no entries found; check the scrape selectors");
    }

    // --- Phase 3: Render ---
    progress.phase("Rendering artifacts");
    let opts = EmitOptions::from(&config.output);
    let artifacts = docbind_codegen::render(&registries, &opts)?;

    // --- Phase 4: Write ---
    progress.phase("Writing artifacts");
    let info = ManifestInfo {
        source_url: config.input.describe(),
        tool_version: config.tool_version.clone(),
        input_sha256: Some(input_sha256),
        type_count: registries.types.len(),
        operation_count: registries.operations.len(),
    };
    let manifest = write_output(&config.out_dir, &config.output, &artifacts, &info)?;

    let result = GenerateResult {
        out_dir: config.out_dir.clone(),
        type_count: info.type_count,
        operation_count: info.operation_count,
        manifest,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        types = result.type_count,
        operations = result.operation_count,
        elapsed_ms = result.elapsed.as_millis(),
        "generate pipeline complete"
    );

    Ok(result)
}

/// Re-render every artifact from a frozen snapshot, without touching the network.
///
/// Provenance (source and input checksum) is carried over from the snapshot's manifest
/// when it has one.
#[instrument(skip_all, fields(snapshot = %config.snapshot_dir.display(), out = %config.out_dir.display()))]
pub fn regenerate(config: &RegenerateConfig, progress: &dyn ProgressReporter) -> Result<GenerateResult> {
    let start = Instant::now();

    progress.phase("Loading snapshot");
    let registries = load_snapshot(&config.snapshot_dir, &config.output)?;

    let previous = match assembler::read_manifest(&config.snapshot_dir.join(&config.output.manifest_file)) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(error = %e, "snapshot has no usable manifest; provenance not carried over");
            None
        }
    };

    progress.phase("Rendering artifacts");
    let opts = EmitOptions::from(&config.output);
    let artifacts = docbind_codegen::render(&registries, &opts)?;

    progress.phase("Writing artifacts");
    let info = ManifestInfo {
        source_url: previous
            .as_ref()
            .map(|m| m.source_url.clone())
            .unwrap_or_else(|| config.snapshot_dir.display().to_string()),
        tool_version: config.tool_version.clone(),
        input_sha256: previous.and_then(|m| m.input_sha256),
        type_count: registries.types.len(),
        operation_count: registries.operations.len(),
    };
    let manifest = write_output(&config.out_dir, &config.output, &artifacts, &info)?;

    let result = GenerateResult {
        out_dir: config.out_dir.clone(),
        type_count: info.type_count,
        operation_count: info.operation_count,
        manifest,
        elapsed: start.elapsed(),
    };

    progress.done(&result);
    info!(types = result.type_count, operations = result.operation_count, "regenerate complete");

    Ok(result)
}

/// Parse and scrape an HTML page into resolved registries.
pub fn scrape_html(html: &str, config: &ScrapeConfig) -> Result<Registries> {
    let doc = Document::parse(html);
    docbind_scrape::scrape(&doc, config)
}

/// Load the two dump files of a snapshot directory.
pub fn load_snapshot(dir: &Path, output: &OutputConfig) -> Result<Registries> {
    let types_path = dir.join(&output.types_dump);
    let operations_path = dir.join(&output.operations_dump);

    let types = std::fs::read_to_string(&types_path).map_err(|e| DocbindError::io(&types_path, e))?;
    let operations =
        std::fs::read_to_string(&operations_path).map_err(|e| DocbindError::io(&operations_path, e))?;

    docbind_codegen::load_registries(&types, &operations)
}

async fn read_input(input: &InputSource, fetch: &FetchOptions) -> Result<String> {
    match input {
        InputSource::Url(url) => docbind_fetch::fetch_document(url, fetch).await,
        InputSource::File(path) => std::fs::read_to_string(path).map_err(|e| DocbindError::io(path, e)),
    }
}

fn write_output(
    dir: &Path,
    output: &OutputConfig,
    artifacts: &Artifacts,
    info: &ManifestInfo,
) -> Result<SnapshotManifest> {
    let files = [
        (output.types_dump.as_str(), artifacts.types_json.as_str()),
        (output.operations_dump.as_str(), artifacts.operations_json.as_str()),
        (output.models_file.as_str(), artifacts.models.as_str()),
        (output.bindings_file.as_str(), artifacts.bindings.as_str()),
    ];

    let metas = files
        .iter()
        .map(|(filename, content)| assembler::artifact_meta(filename, content))
        .collect();
    let manifest = assembler::build_manifest(info, metas);
    let manifest_json = assembler::render_manifest(&manifest)?;

    let mut batch = files.to_vec();
    batch.push((output.manifest_file.as_str(), manifest_json.as_str()));
    assembler::write_batch(dir, &batch)?;

    info!(count = batch.len(), dir = %dir.display(), "artifacts written");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docbind-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/html/reference.html")
    }

    fn generate_config(input: InputSource, out_dir: PathBuf) -> GenerateConfig {
        GenerateConfig {
            input,
            fetch: FetchOptions::default(),
            scrape: ScrapeConfig::default(),
            output: OutputConfig::default(),
            out_dir,
            tool_version: "0.1.0-test".into(),
        }
    }

    #[tokio::test]
    async fn generate_from_file_writes_all_artifacts() {
        let tmp = temp_dir();
        let out = tmp.join("generated");
        let config = generate_config(InputSource::File(fixture_path()), out.clone());

        let result = generate(&config, &SilentProgress).await.unwrap();

        assert!(result.type_count > 0);
        assert!(result.operation_count > 0);
        for name in ["types.json", "operations.json", "models.rs", "bindings.rs", "manifest.json"] {
            assert!(out.join(name).exists(), "missing {name}");
        }

        let models = std::fs::read_to_string(out.join("models.rs")).unwrap();
        assert!(models.contains("pub struct User {"));
        let bindings = std::fs::read_to_string(out.join("bindings.rs")).unwrap();
        assert!(bindings.contains("pub async fn get_me(&self) -> Result<User, ApiError>"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn manifest_checksums_match_files() {
        let tmp = temp_dir();
        let config = generate_config(InputSource::File(fixture_path()), tmp.clone());
        generate(&config, &SilentProgress).await.unwrap();

        let manifest = assembler::read_manifest(&tmp.join("manifest.json")).unwrap();
        assert_eq!(manifest.artifacts.len(), 4);
        for artifact in &manifest.artifacts {
            let bytes = std::fs::read(tmp.join(&artifact.filename)).unwrap();
            assert_eq!(artifact.sha256, assembler::sha256_hex(&bytes));
            assert_eq!(artifact.size_bytes, bytes.len());
        }

        let html = std::fs::read(fixture_path()).unwrap();
        assert_eq!(manifest.input_sha256, Some(assembler::sha256_hex(&html)));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn generate_from_url() {
        let server = wiremock::MockServer::start().await;
        let html = std::fs::read_to_string(fixture_path()).unwrap();

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/bots/api"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let tmp = temp_dir();
        let url = Url::parse(&format!("{}/bots/api", server.uri())).unwrap();
        let config = generate_config(InputSource::Url(url.clone()), tmp.clone());

        let result = generate(&config, &SilentProgress).await.unwrap();
        assert_eq!(result.manifest.source_url, url.to_string());
        assert!(tmp.join("bindings.rs").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn failures_write_nothing() {
        let tmp = temp_dir();
        let input = tmp.join("broken.html");
        std::fs::write(
            &input,
            r##"<body><h4><a class="anchor" href="#x"></a>doThing</h4><p>Does a thing.</p></body>"##,
        )
        .unwrap();

        let out = tmp.join("out");
        let config = generate_config(InputSource::File(input), out.clone());

        let err = generate(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocbindError::Classification { .. }));
        assert!(!out.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn blocked_artifact_leaves_previous_output_untouched() {
        let tmp = temp_dir();
        let out = tmp.join("out");
        std::fs::create_dir_all(out.join("bindings.rs")).unwrap();
        std::fs::write(out.join("models.rs"), "// previous run\n").unwrap();

        let config = generate_config(InputSource::File(fixture_path()), out.clone());
        let err = generate(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocbindError::Io { .. }));

        assert!(!out.join("types.json").exists());
        assert!(!out.join("operations.json").exists());
        assert!(!out.join("manifest.json").exists());
        assert_eq!(std::fs::read_to_string(out.join("models.rs")).unwrap(), "// previous run\n");

        let leftovers: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with('.'))
            .collect();
        assert!(leftovers.is_empty(), "staging files left behind: {leftovers:?}");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn missing_input_file_is_io_error() {
        let tmp = temp_dir();
        let config = generate_config(InputSource::File(tmp.join("nope.html")), tmp.join("out"));
        let err = generate(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocbindError::Io { .. }));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn regenerate_is_byte_identical() {
        let tmp = temp_dir();
        let snapshot = tmp.join("snapshot");
        let config = generate_config(InputSource::File(fixture_path()), snapshot.clone());
        let original = generate(&config, &SilentProgress).await.unwrap();

        let regen_out = tmp.join("regen");
        let regen = RegenerateConfig {
            snapshot_dir: snapshot.clone(),
            output: OutputConfig::default(),
            out_dir: regen_out.clone(),
            tool_version: "0.1.0-test".into(),
        };
        let result = regenerate(&regen, &SilentProgress).unwrap();

        for name in ["types.json", "operations.json", "models.rs", "bindings.rs"] {
            assert_eq!(
                std::fs::read(snapshot.join(name)).unwrap(),
                std::fs::read(regen_out.join(name)).unwrap(),
                "{name} differs"
            );
        }
        assert_eq!(result.type_count, original.type_count);
        assert_eq!(result.manifest.input_sha256, original.manifest.input_sha256);
        assert_eq!(result.manifest.source_url, original.manifest.source_url);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn regenerate_without_dumps_fails() {
        let tmp = temp_dir();
        let regen = RegenerateConfig {
            snapshot_dir: tmp.clone(),
            output: OutputConfig::default(),
            out_dir: tmp.join("out"),
            tool_version: "0.1.0-test".into(),
        };
        let err = regenerate(&regen, &SilentProgress).unwrap_err();
        assert!(matches!(err, DocbindError::Io { .. }));
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
