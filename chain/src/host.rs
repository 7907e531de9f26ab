use {
    crate::pose::Pose,
    std::{
        error::Error,
        fmt::{self, Debug, Display, Formatter},
        path::Path,
    },
};

/// File formats meshes are exported to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Collada,
    Stl,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Collada => "dae",
            ExportFormat::Stl => "stl",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Collada => fmt.write_str("Collada"),
            ExportFormat::Stl => fmt.write_str("STL"),
        }
    }
}

/// Environment that owns meshes and their poses.
///
/// Meshes are addressed by handles returned from `import_mesh`,
/// never by ambient selection.
pub trait MeshHost {
    type Handle: Copy + Debug + PartialEq;
    type Error: Error + Send + Sync + 'static;

    /// Imports mesh file into the working scene and makes it active.
    fn import_mesh(&mut self, path: &Path) -> Result<Self::Handle, Self::Error>;

    /// Most recently imported mesh that is still in the scene.
    fn active_mesh(&self) -> Option<Self::Handle>;

    fn mesh_name(&self, mesh: Self::Handle) -> Result<String, Self::Error>;

    fn pose(&self, mesh: Self::Handle) -> Result<Pose, Self::Error>;

    fn set_pose(
        &mut self,
        mesh: Self::Handle,
        pose: Pose,
    ) -> Result<(), Self::Error>;

    /// Moves mesh origin to the scene reference point,
    /// keeping its geometry where it is.
    fn set_origin_to_reference_point(
        &mut self,
        mesh: Self::Handle,
    ) -> Result<(), Self::Error>;

    /// Persists the whole working scene.
    fn save_working_state(
        &mut self,
        path: &Path,
        overwrite: bool,
    ) -> Result<(), Self::Error>;

    fn export_to(
        &mut self,
        mesh: Self::Handle,
        path: &Path,
        format: ExportFormat,
    ) -> Result<(), Self::Error>;

    fn remove_mesh(&mut self, mesh: Self::Handle) -> Result<(), Self::Error>;
}
