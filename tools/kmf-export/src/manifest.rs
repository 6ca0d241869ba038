//! kmf.toml manifest parsing and batch builds

use anyhow::{Context, Result, bail};
use hashbrown::HashSet;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use kmf_common::formats::{KMF_EXTENSION, MAX_SCALE_FACTOR};

use crate::export::{ExportSummary, convert_scene};
use crate::mesh::SourceFormat;

/// Output directory used when neither the manifest nor the command line names one
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// kmf.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct KmfManifest {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub models: Vec<ModelEntry>,

    /// Directory containing the manifest; relative paths resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Output settings shared by every model
#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    /// Output directory, relative to the manifest
    pub dir: Option<String>,

    /// Default downscale exponent (0-8)
    #[serde(default)]
    pub scale_factor: u8,
}

/// Single model entry
#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    /// Output file stem
    pub id: String,
    /// Source scene, relative to the manifest
    pub path: String,

    /// Overrides `output.scale_factor`
    #[serde(default)]
    pub scale_factor: Option<u8>,

    /// Written to every block of this model
    #[serde(default)]
    pub render_type: u8,
}

impl KmfManifest {
    /// Parse manifest from string; relative paths resolve against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: Self = toml::from_str(content).context("Failed to parse kmf.toml")?;
        manifest.base_dir = base_dir.to_path_buf();
        Ok(manifest)
    }

    /// Scale factor for one entry after applying the default
    pub fn scale_factor_for(&self, entry: &ModelEntry) -> u8 {
        entry.scale_factor.unwrap_or(self.output.scale_factor)
    }

    pub fn source_path(&self, entry: &ModelEntry) -> PathBuf {
        self.base_dir.join(&entry.path)
    }

    /// Output directory, with an optional command-line override
    pub fn output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        match (override_dir, &self.output.dir) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => self.base_dir.join(dir),
            (None, None) => self.base_dir.join(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Load manifest from file
pub fn load_manifest(path: &Path) -> Result<KmfManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    KmfManifest::parse(&content, base_dir)
}

/// Check ids, formats, scale factors and that every source exists
pub fn validate(manifest: &KmfManifest) -> Result<()> {
    let mut problems = Vec::new();

    if manifest.output.scale_factor > MAX_SCALE_FACTOR {
        problems.push(format!(
            "output.scale_factor {} exceeds maximum {}",
            manifest.output.scale_factor, MAX_SCALE_FACTOR
        ));
    }

    let mut seen = HashSet::new();
    for entry in &manifest.models {
        if entry.id.trim().is_empty() {
            problems.push(format!("model with path '{}' has an empty id", entry.path));
        } else if !seen.insert(entry.id.as_str()) {
            problems.push(format!("duplicate model id '{}'", entry.id));
        }

        if entry.id.contains(['/', '\\']) {
            problems.push(format!("model id '{}' must not contain path separators", entry.id));
        }

        let source = manifest.source_path(entry);
        if SourceFormat::from_path(&source).is_none() {
            problems.push(format!(
                "model '{}': unsupported format {:?} (use .gltf, .glb, or .obj)",
                entry.id, source
            ));
        } else if !source.is_file() {
            problems.push(format!("model '{}': source {:?} not found", entry.id, source));
        }

        if let Some(scale) = entry.scale_factor.filter(|&s| s > MAX_SCALE_FACTOR) {
            problems.push(format!(
                "model '{}': scale_factor {} exceeds maximum {}",
                entry.id, scale, MAX_SCALE_FACTOR
            ));
        }
    }

    if !problems.is_empty() {
        for p in &problems {
            tracing::error!("{}", p);
        }
        bail!("Manifest has {} problem(s): {}", problems.len(), problems.join("; "));
    }

    if manifest.models.is_empty() {
        tracing::warn!("Manifest declares no models");
    }
    Ok(())
}

/// Build every model in the manifest, in parallel
///
/// Existing outputs are replaced atomically. All models are attempted even
/// when some fail; the error lists every failure.
pub fn build_all(manifest: &KmfManifest, output_override: Option<&Path>) -> Result<Vec<ExportSummary>> {
    validate(manifest)?;

    let out_dir = manifest.output_dir(output_override);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let results: Vec<(&str, Result<ExportSummary>)> = manifest
        .models
        .par_iter()
        .map(|entry| {
            let input = manifest.source_path(entry);
            let output = out_dir.join(format!("{}.{}", entry.id, KMF_EXTENSION));
            tracing::info!("Building '{}': {:?} -> {:?}", entry.id, input, output);
            let result = convert_scene(
                &input,
                &output,
                manifest.scale_factor_for(entry),
                entry.render_type,
                true,
            )
            .with_context(|| format!("Failed to build model '{}'", entry.id));
            (entry.id.as_str(), result)
        })
        .collect();

    let mut built = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(summary) => built.push(summary),
            Err(e) => {
                tracing::error!("{:#}", e);
                failed.push(id);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} model(s) failed to build: {}", failed.len(), failed.join(", "));
    }
    Ok(built)
}
