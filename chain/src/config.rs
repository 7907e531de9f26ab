use {
    crate::host::ExportFormat,
    std::path::{Path, PathBuf},
};

pub const CONFIG_PATH_ENV: &str = "LINKMESH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./linkmesh.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to open config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config '{}': {source}", path.display())]
    Ron { path: PathBuf, source: ron::Error },
}

/// How accumulated ops reach a mesh pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum ApplyMode {
    /// Every accumulated op is applied one by one.
    Replay,

    /// Cached composition of accumulated ops is applied once.
    Composed,
}

impl Default for ApplyMode {
    fn default() -> Self {
        ApplyMode::Replay
    }
}

/// Sub-directories of the base directory, relative unless absolute.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Layout {
    pub src_stl: PathBuf,
    pub dst_stl: PathBuf,
    pub dst_dae: PathBuf,
    pub dst_blend: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            src_stl: PathBuf::from("stl-orig"),
            dst_stl: PathBuf::from("stl"),
            dst_dae: PathBuf::from("dae"),
            dst_blend: PathBuf::from("blend"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: Layout,

    /// Scene marker mesh origins are moved to.
    pub reference_point: [f32; 3],

    pub apply: ApplyMode,
}

impl Config {
    /// Loads config from `LINKMESH_CONFIG_PATH` or `./linkmesh.ron`.
    /// Falls back to defaults if neither exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(path)
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        ron::de::from_reader(file).map_err(|source| ConfigError::Ron {
            path: path.to_owned(),
            source,
        })
    }
}

/// Directories of one run, resolved against the base directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Dirs {
    pub base: PathBuf,
    pub src_stl: PathBuf,
    pub dst_stl: PathBuf,
    pub dst_dae: PathBuf,
    pub dst_blend: PathBuf,
}

impl Dirs {
    pub fn resolve(base: &Path, layout: &Layout) -> Self {
        Dirs {
            base: base.to_owned(),
            src_stl: base.join(&layout.src_stl),
            dst_stl: base.join(&layout.dst_stl),
            dst_dae: base.join(&layout.dst_dae),
            dst_blend: base.join(&layout.dst_blend),
        }
    }

    /// Creates output directories that do not exist yet.
    pub fn create_outputs(&self) -> std::io::Result<()> {
        for dir in &[&self.dst_stl, &self.dst_dae, &self.dst_blend] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn source_mesh(&self, link: &str) -> PathBuf {
        self.src_stl.join(format!("{}.stl", link))
    }

    pub fn working_state(&self, link: &str) -> PathBuf {
        self.dst_blend.join(format!("{}.ron", link))
    }

    pub fn export(&self, link: &str, format: ExportFormat) -> PathBuf {
        let dir = match format {
            ExportFormat::Collada => &self.dst_dae,
            ExportFormat::Stl => &self.dst_stl,
        };
        dir.join(format!("{}.{}", link, format.extension()))
    }
}
