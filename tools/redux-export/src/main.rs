//! redux-export - Kerbonaut Redux mesh export tool
//!
//! Converts OBJ/glTF meshes to the sidecar set (.vtx, .tex, .nml, .idx)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::Vec3;

use redux_export::{
    AxisConversion, ExportSettings, REDUX_SIDECAR_FORMAT, ReduxManifest, SidecarMesh,
    Triangulation, build_all, convert_file, sidecar_path,
};

#[derive(Parser)]
#[command(name = "redux-export")]
#[command(about = "Kerbonaut Redux mesh export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a single mesh file
    Mesh {
        /// Input mesh file (OBJ/glTF/GLB)
        input: PathBuf,

        /// Base name of the output files (default: input file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory (default: the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Build every mesh in a manifest
    Build {
        /// Path to redux.toml manifest
        #[arg(default_value = "redux.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Validate manifest without building
    Check {
        /// Path to redux.toml manifest
        #[arg(default_value = "redux.toml")]
        manifest: PathBuf,
    },

    /// Decode a sidecar set and print a summary
    Inspect {
        /// Sidecar base path, without extension (e.g. Models/ValentinaHair)
        base: PathBuf,
    },
}

/// Conversion flags; each one overrides the manifest's `[export]` value.
#[derive(Args)]
struct SettingsArgs {
    /// Axis conversion: blender-to-unity, identity, or e.g. "y,z,-x"
    #[arg(long)]
    axis: Option<AxisConversion>,

    /// Polygon triangulation
    #[arg(long, value_enum)]
    triangulation: Option<Triangulation>,

    /// Weld vertices whose attributes agree to this many decimal places
    #[arg(long)]
    weld_precision: Option<u32>,
}

impl SettingsArgs {
    fn apply(&self, mut settings: ExportSettings) -> ExportSettings {
        if let Some(axis) = self.axis {
            settings.axis = axis;
        }
        if let Some(triangulation) = self.triangulation {
            settings.triangulation = triangulation;
        }
        if self.weld_precision.is_some() {
            settings.weld_precision = self.weld_precision;
        }
        settings
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mesh {
            input,
            name,
            output,
            settings,
        } => {
            let name = match name {
                Some(name) => name,
                None => input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("Cannot derive a name from {}", input.display()))?,
            };
            let dir = output.unwrap_or_else(|| parent_dir(&input));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

            let base = dir.join(&name);
            tracing::info!("Converting {} -> {}", input.display(), base.display());

            let report = convert_file(&input, &base, &settings.apply(ExportSettings::default()));
            if !report.success {
                anyhow::bail!("{}", report.message);
            }
            println!("{}", report.message);
        }

        Commands::Build {
            manifest,
            output,
            settings,
        } => {
            tracing::info!("Building meshes from {}", manifest.display());
            let config = ReduxManifest::load(&manifest)?;
            let settings = settings.apply(config.export.settings);

            let results = build_all(&config, &parent_dir(&manifest), output.as_deref(), &settings)?;
            tracing::info!("Build complete! {} meshes exported", results.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {}", manifest.display());
            let config = ReduxManifest::load(&manifest)?;
            config.validate(&parent_dir(&manifest), None)?;
            tracing::info!("Manifest is valid! {} meshes", config.meshes.len());
        }

        Commands::Inspect { base } => {
            let mesh = SidecarMesh::read(&base)
                .with_context(|| format!("Failed to read sidecar set {}", base.display()))?;
            mesh.validate()
                .with_context(|| format!("Sidecar set {} is inconsistent", base.display()))?;
            print_summary(&base, &mesh);
        }
    }

    Ok(())
}

/// Directory containing `path`, or `.` for a bare file name.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn print_summary(base: &Path, mesh: &SidecarMesh) {
    println!("{}", base.display());
    println!("  Vertices:  {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    println!(
        "  UVs:       {}",
        if mesh.uvs.is_some() { "yes" } else { "no" }
    );

    let bounds = mesh.positions.iter().map(|&p| Vec3::from_array(p)).fold(
        None,
        |acc: Option<(Vec3, Vec3)>, p| match acc {
            Some((min, max)) => Some((min.min(p), max.max(p))),
            None => Some((p, p)),
        },
    );
    if let Some((min, max)) = bounds {
        println!("  Bounds:    {:?} .. {:?}", min.to_array(), max.to_array());
    }

    for ext in REDUX_SIDECAR_FORMAT.all() {
        let path = sidecar_path(base, ext);
        if let Ok(meta) = std::fs::metadata(&path) {
            println!("  .{ext}:      {} bytes", meta.len());
        }
    }
}
