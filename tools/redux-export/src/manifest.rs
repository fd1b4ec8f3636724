//! redux.toml manifest parsing and batch builds
//!
//! ```toml
//! [export]
//! output_dir = "Models"
//! axis = "blender-to-unity"
//! triangulation = "fan"
//! weld_precision = 5
//!
//! [[meshes]]
//! name = "ValentinaHair"
//! path = "ValentinaHair.obj"
//! output_dir = "Hair"
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hashbrown::HashSet;
use serde::Deserialize;

use crate::convert::{ConversionReport, ExportSettings, MeshSource, convert_file};

/// redux.toml manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct ReduxManifest {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
}

/// Settings shared by every mesh
#[derive(Debug, Default, Deserialize)]
pub struct ExportSection {
    /// Output root; the manifest's directory when unset
    pub output_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub settings: ExportSettings,
}

/// Single mesh entry
#[derive(Debug, Deserialize)]
pub struct MeshEntry {
    /// Base name of the sidecar files
    pub name: String,
    /// Source file (.obj, .gltf or .glb)
    pub path: PathBuf,
    /// Subdirectory of the output root
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// A mesh entry with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub name: String,
    pub input: PathBuf,
    /// Sidecar base path, without extension
    pub base: PathBuf,
}

impl ReduxManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse redux.toml")
    }

    /// Resolve every entry against `manifest_dir`. `output_override` replaces
    /// `[export].output_dir`; per-mesh subdirectories still apply beneath it.
    pub fn jobs(&self, manifest_dir: &Path, output_override: Option<&Path>) -> Vec<ConversionJob> {
        let root = match (output_override, &self.export.output_dir) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => manifest_dir.join(dir),
            (None, None) => manifest_dir.to_path_buf(),
        };

        self.meshes
            .iter()
            .map(|entry| {
                let dir = match &entry.output_dir {
                    Some(sub) => root.join(sub),
                    None => root.clone(),
                };
                ConversionJob {
                    name: entry.name.clone(),
                    input: manifest_dir.join(&entry.path),
                    base: dir.join(&entry.name),
                }
            })
            .collect()
    }

    /// Validate entries without converting anything
    pub fn validate(&self, manifest_dir: &Path, output_override: Option<&Path>) -> Result<()> {
        if self.meshes.is_empty() {
            tracing::warn!("Manifest declares no meshes");
        }

        for entry in &self.meshes {
            if entry.name.is_empty() {
                bail!(
                    "Mesh entry for {} has an empty name",
                    entry.path.display()
                );
            }
            if entry.name.contains(['/', '\\']) {
                bail!(
                    "Mesh name '{}' must not contain path separators (use output_dir)",
                    entry.name
                );
            }
        }

        let mut bases = HashSet::new();
        for job in self.jobs(manifest_dir, output_override) {
            MeshSource::from_path(&job.input).with_context(|| format!("Mesh '{}'", job.name))?;
            if !job.input.is_file() {
                bail!(
                    "Mesh '{}': input not found: {}",
                    job.name,
                    job.input.display()
                );
            }
            if !bases.insert(job.base.clone()) {
                bail!(
                    "Mesh '{}': output {} is already produced by another entry",
                    job.name,
                    job.base.display()
                );
            }
        }

        Ok(())
    }
}

/// Convert every manifest entry in parallel.
///
/// Every mesh is attempted; the error names all meshes that failed.
pub fn build_all(
    manifest: &ReduxManifest,
    manifest_dir: &Path,
    output_override: Option<&Path>,
    settings: &ExportSettings,
) -> Result<Vec<(ConversionJob, ConversionReport)>> {
    use rayon::prelude::*;

    manifest.validate(manifest_dir, output_override)?;
    let jobs = manifest.jobs(manifest_dir, output_override);

    for job in &jobs {
        if let Some(dir) = job.base.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
    }

    let results: Vec<(ConversionJob, ConversionReport)> = jobs
        .into_par_iter()
        .map(|job| {
            tracing::info!(
                "Converting {} -> {}",
                job.input.display(),
                job.base.display()
            );
            let report = convert_file(&job.input, &job.base, settings);
            (job, report)
        })
        .collect();

    let mut failed = Vec::new();
    for (job, report) in &results {
        if report.success {
            tracing::info!("{}: {}", job.name, report.message);
        } else {
            failed.push(job.name.as_str());
        }
        if !report.warnings.is_empty() {
            tracing::warn!("{}: {} records skipped", job.name, report.warnings.len());
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} meshes failed: {}",
            failed.len(),
            results.len(),
            failed.join(", ")
        );
    }

    Ok(results)
}
