//! Working scene the chain pipeline imports link meshes into.
//!
//! Objects live in a `hecs` world. Meshes come from STL files and leave as
//! STL, Collada and a RON dump of the whole scene.

mod collada;
mod mesh;
mod scene;

pub use self::{
    collada::write_collada,
    mesh::{StlError, TriMesh, Triangle},
    scene::{object_name, Name, ObjectSnapshot, Scene, SceneSnapshot},
};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("I/O error on '{}': {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to read or write STL '{}': {source}", path.display())]
    Stl { path: PathBuf, source: StlError },

    #[error("Failed to write XML: {source}")]
    Xml {
        #[from]
        source: quick_xml::Error,
    },

    #[error("Failed to serialize scene '{}': {source}", path.display())]
    Ron { path: PathBuf, source: ron::Error },

    #[error("No mesh {entity:?} in scene")]
    NoSuchMesh { entity: hecs::Entity },

    #[error("'{}' already exists", path.display())]
    AlreadyExists { path: PathBuf },
}
