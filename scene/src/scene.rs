use {
    crate::{
        collada::write_collada,
        mesh::{StlError, TriMesh},
        SceneError,
    },
    hecs::{Entity, World},
    linkmesh::{ExportFormat, MeshHost, Pose},
    nalgebra as na,
    serde::{Deserialize, Serialize},
    std::{
        fs::File,
        io::BufWriter,
        path::{Path, PathBuf},
    },
};

/// Object name component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name(pub String);

/// Working scene holding imported mesh objects.
pub struct Scene {
    world: World,
    active: Option<Entity>,
    reference_point: na::Point3<f32>,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene::with_reference_point(na::Point3::origin())
    }

    pub fn with_reference_point(reference_point: na::Point3<f32>) -> Self {
        Scene {
            world: World::new(),
            active: None,
            reference_point,
        }
    }

    /// Adds object to the scene and makes it active.
    /// Name gets numeric suffix if already taken.
    pub fn spawn(&mut self, name: &str, mesh: TriMesh, pose: Pose) -> Entity {
        let name = self.unique_name(name);
        tracing::debug!("Spawning '{}' with {} triangles", name, mesh.len());
        let entity = self.world.spawn((Name(name), pose, mesh));
        self.active = Some(entity);
        entity
    }

    pub fn len(&self) -> usize {
        self.world.query::<&Name>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.0 == name)
            .map(|(entity, _)| entity)
    }

    /// Mesh in its local frame.
    pub fn local_mesh(&self, entity: Entity) -> Result<TriMesh, SceneError> {
        let mesh = self
            .world
            .get::<TriMesh>(entity)
            .map_err(|_| SceneError::NoSuchMesh { entity })?;
        Ok(TriMesh::clone(&mesh))
    }

    /// Mesh with object transform applied.
    pub fn world_mesh(&self, entity: Entity) -> Result<TriMesh, SceneError> {
        let iso = self.pose(entity)?.to_iso();
        Ok(self.local_mesh(entity)?.transformed(&iso))
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let mut objects: Vec<_> = self
            .world
            .query::<(&Name, &Pose, &TriMesh)>()
            .iter()
            .map(|(entity, (name, pose, mesh))| {
                (
                    entity.id(),
                    ObjectSnapshot {
                        name: name.0.clone(),
                        pose: *pose,
                        mesh: mesh.clone(),
                    },
                )
            })
            .collect();
        objects.sort_by_key(|(id, _)| *id);

        SceneSnapshot {
            reference_point: self.reference_point,
            objects: objects.into_iter().map(|(_, object)| object).collect(),
        }
    }

    fn unique_name(&self, name: &str) -> String {
        if self.find(name).is_none() {
            return name.to_owned();
        }
        (1..)
            .map(|n| format!("{}.{:03}", name, n))
            .find(|candidate| self.find(candidate).is_none())
            .unwrap_or_else(|| name.to_owned())
    }
}

impl MeshHost for Scene {
    type Handle = Entity;
    type Error = SceneError;

    fn import_mesh(&mut self, path: &Path) -> Result<Entity, SceneError> {
        let file = File::open(path).map_err(|source| SceneError::File {
            path: path.to_owned(),
            source,
        })?;
        let mesh = TriMesh::read_stl(file).map_err(|source| stl_error(path, source))?;

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self.spawn(&object_name(&stem), mesh, Pose::identity()))
    }

    fn active_mesh(&self) -> Option<Entity> {
        self.active
    }

    fn mesh_name(&self, entity: Entity) -> Result<String, SceneError> {
        let name = self
            .world
            .get::<Name>(entity)
            .map_err(|_| SceneError::NoSuchMesh { entity })?;
        Ok(name.0.clone())
    }

    fn pose(&self, entity: Entity) -> Result<Pose, SceneError> {
        let pose = self
            .world
            .get::<Pose>(entity)
            .map_err(|_| SceneError::NoSuchMesh { entity })?;
        Ok(*pose)
    }

    fn set_pose(&mut self, entity: Entity, pose: Pose) -> Result<(), SceneError> {
        let mut current = self
            .world
            .get_mut::<Pose>(entity)
            .map_err(|_| SceneError::NoSuchMesh { entity })?;
        *current = pose;
        Ok(())
    }

    fn set_origin_to_reference_point(
        &mut self,
        entity: Entity,
    ) -> Result<(), SceneError> {
        let mut pose = self.pose(entity)?;

        // Geometry keeps its world position, only the object origin moves.
        let offset = pose.orientation().inverse()
            * (pose.location - self.reference_point.coords);

        {
            let mut mesh = self
                .world
                .get_mut::<TriMesh>(entity)
                .map_err(|_| SceneError::NoSuchMesh { entity })?;
            mesh.translate(&offset);
        }

        pose.location = self.reference_point.coords;
        self.set_pose(entity, pose)
    }

    fn save_working_state(
        &mut self,
        path: &Path,
        overwrite: bool,
    ) -> Result<(), SceneError> {
        if path.exists() {
            if !overwrite {
                return Err(SceneError::AlreadyExists {
                    path: path.to_owned(),
                });
            }
            std::fs::remove_file(path).map_err(|source| SceneError::File {
                path: path.to_owned(),
                source,
            })?;
        }

        let text = ron::ser::to_string_pretty(
            &self.snapshot(),
            ron::ser::PrettyConfig::default(),
        )
        .map_err(|source| SceneError::Ron {
            path: path.to_owned(),
            source,
        })?;

        std::fs::write(path, text).map_err(|source| SceneError::File {
            path: path.to_owned(),
            source,
        })
    }

    fn export_to(
        &mut self,
        entity: Entity,
        path: &Path,
        format: ExportFormat,
    ) -> Result<(), SceneError> {
        let file = File::create(path).map_err(|source| SceneError::File {
            path: path.to_owned(),
            source,
        })?;
        let writer = BufWriter::new(file);

        match format {
            ExportFormat::Stl => self
                .world_mesh(entity)?
                .write_stl(writer)
                .map_err(|source| stl_error(path, source)),
            ExportFormat::Collada => {
                let name = self.mesh_name(entity)?;
                let transform = self.pose(entity)?.to_homogeneous();
                write_collada(writer, &name, &self.local_mesh(entity)?, &transform)
            }
        }
    }

    fn remove_mesh(&mut self, entity: Entity) -> Result<(), SceneError> {
        self.world
            .despawn(entity)
            .map_err(|_| SceneError::NoSuchMesh { entity })?;
        if self.active == Some(entity) {
            self.active = None;
        }
        Ok(())
    }
}

fn stl_error(path: &Path, source: StlError) -> SceneError {
    SceneError::Stl {
        path: path.to_owned(),
        source,
    }
}

/// Name an imported mesh object gets: `base_link` becomes `Base Link`.
pub fn object_name(stem: &str) -> String {
    let mut name = String::with_capacity(stem.len());
    let mut in_word = false;
    for c in stem.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                name.extend(c.to_lowercase());
            } else {
                name.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            name.push(c);
            in_word = false;
        }
    }
    name
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub pose: Pose,
    pub mesh: TriMesh,
}

/// Serialized form of the working scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub reference_point: na::Point3<f32>,
    pub objects: Vec<ObjectSnapshot>,
}

impl SceneSnapshot {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let file = File::open(path).map_err(|source| SceneError::File {
            path: path.to_owned(),
            source,
        })?;
        ron::de::from_reader(file).map_err(|source| SceneError::Ron {
            path: PathBuf::from(path),
            source,
        })
    }
}
