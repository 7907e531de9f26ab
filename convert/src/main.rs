use {
    clap::{CommandFactory as _, Parser},
    color_eyre::Report,
    eyre::WrapErr,
    linkmesh::{load_chain_spec, Config, Dirs, Pipeline},
    linkmesh_scene::Scene,
    nalgebra as na,
    std::path::PathBuf,
    tracing_subscriber::EnvFilter,
};

/// Poses link meshes of a kinematic chain and exports them.
#[derive(Debug, Parser)]
#[command(name = "linkmesh-convert", version)]
struct Cli {
    /// Log debug messages.
    #[arg(short, long)]
    verbose: bool,

    /// RON run configuration.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory with source STL meshes.
    #[arg(long, value_name = "P")]
    src_stl: Option<PathBuf>,

    /// Output directory for posed STL meshes.
    #[arg(long, value_name = "P")]
    dst_stl: Option<PathBuf>,

    /// Output directory for Collada files.
    #[arg(long, value_name = "P")]
    dst_dae: Option<PathBuf>,

    /// Output directory for working scene dumps.
    #[arg(long, value_name = "P")]
    dst_blend: Option<PathBuf>,

    /// Base directory the mesh directories are relative to.
    #[arg(value_name = "BASE_DIR")]
    base_dir: PathBuf,

    /// INI file with `[model]` chain and per-link `[ops]`.
    #[arg(value_name = "LINK_INFO")]
    link_info: PathBuf,
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        return Ok(());
    }
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(path) = cli.src_stl {
        config.layout.src_stl = path;
    }
    if let Some(path) = cli.dst_stl {
        config.layout.dst_stl = path;
    }
    if let Some(path) = cli.dst_dae {
        config.layout.dst_dae = path;
    }
    if let Some(path) = cli.dst_blend {
        config.layout.dst_blend = path;
    }

    let base_dir = cli.base_dir;
    let base = base_dir.canonicalize().wrap_err_with(|| {
        format!("Base directory '{}' not found", base_dir.display())
    })?;
    let dirs = Dirs::resolve(&base, &config.layout);

    tracing::info!("Base dir: {}", dirs.base.display());
    tracing::info!("Source STLs: {}", dirs.src_stl.display());
    tracing::info!("Destination STLs: {}", dirs.dst_stl.display());
    tracing::info!("Destination Collada: {}", dirs.dst_dae.display());
    tracing::info!("Destination scenes: {}", dirs.dst_blend.display());
    tracing::info!("Link info: {}", cli.link_info.display());

    let spec = match load_chain_spec(&cli.link_info) {
        Ok(spec) => spec,
        Err(err) => {
            tracing::error!("{}", err);
            return Ok(());
        }
    };

    dirs.create_outputs()
        .wrap_err("Failed to create output directories")?;

    let [x, y, z] = config.reference_point;
    let mut scene = Scene::with_reference_point(na::Point3::new(x, y, z));
    let summary = Pipeline::new(&mut scene, &dirs, config.apply).run(&spec.parsed);

    tracing::info!(
        "Processed {} link(s), {} failed",
        summary.processed.len(),
        summary.failed.len()
    );
    for failure in &summary.failed {
        tracing::warn!("Link '{}' failed at {}", failure.link, failure.step);
    }

    Ok(())
}
