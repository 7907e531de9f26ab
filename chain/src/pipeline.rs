use {
    crate::{
        accum::{accumulate, AccumulatedLink},
        config::{ApplyMode, Dirs},
        host::{ExportFormat, MeshHost},
        op::{Op, PoseTransform as _},
        parse::ParsedChain,
    },
    std::{
        error::Error,
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
};

/// Step of a link's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Import,
    Resolve,
    Transform,
    FixOrigin,
    Save,
    Export(ExportFormat),
    Remove,
}

impl Display for Step {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Step::Import => fmt.write_str("import mesh"),
            Step::Resolve => fmt.write_str("resolve imported mesh"),
            Step::Transform => fmt.write_str("fix up mesh pose"),
            Step::FixOrigin => fmt.write_str("fix up mesh origin"),
            Step::Save => fmt.write_str("save working state"),
            Step::Export(format) => write!(fmt, "export mesh to {}", format),
            Step::Remove => fmt.write_str("remove mesh from scene"),
        }
    }
}

/// Failure of a single link. Other links are not affected.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {step} for link '{link}': {source}")]
pub struct LinkProcessingError {
    pub link: String,
    pub step: Step,
    pub source: Box<dyn Error + Send + Sync>,
}

/// Files written for a link.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkOutputs {
    pub link: String,
    pub applied: Vec<Op>,
    pub working_state: PathBuf,
    pub collada: PathBuf,
    pub stl: PathBuf,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<LinkOutputs>,
    pub failed: Vec<LinkProcessingError>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives the host through import, posing, saving and export of every link.
pub struct Pipeline<'a, H> {
    host: &'a mut H,
    dirs: &'a Dirs,
    apply: ApplyMode,
}

impl<'a, H> Pipeline<'a, H>
where
    H: MeshHost,
{
    pub fn new(host: &'a mut H, dirs: &'a Dirs, apply: ApplyMode) -> Self {
        Pipeline { host, dirs, apply }
    }

    /// Processes links strictly one after another in chain order.
    pub fn run(&mut self, chain: &ParsedChain) -> RunSummary {
        tracing::info!("Loaded ops for {} links", chain.len());

        let mut summary = RunSummary::default();
        for link in accumulate(chain) {
            match self.process_link(&link) {
                Ok(outputs) => summary.processed.push(outputs),
                Err(err) => {
                    tracing::error!("{}", err);
                    summary.failed.push(err);
                }
            }
        }
        summary
    }

    #[tracing::instrument(skip(self, link), fields(link = %link.link))]
    pub fn process_link(
        &mut self,
        link: &AccumulatedLink,
    ) -> Result<LinkOutputs, LinkProcessingError> {
        let source = self.dirs.source_mesh(&link.link);
        tracing::info!("Importing '{}'", source.display());
        let mesh = self
            .host
            .import_mesh(&source)
            .map_err(|err| fail(link, Step::Import, err))?;

        let result = self.process_mesh(link, mesh);

        tracing::info!("Removing '{}' from scene", link.link);
        let removed = self
            .host
            .remove_mesh(mesh)
            .map_err(|err| fail(link, Step::Remove, err));

        let outputs = result?;
        removed?;
        Ok(outputs)
    }

    fn process_mesh(
        &mut self,
        link: &AccumulatedLink,
        mesh: H::Handle,
    ) -> Result<LinkOutputs, LinkProcessingError> {
        match self.host.active_mesh() {
            Some(active) if active == mesh => {}
            active => {
                return Err(fail(
                    link,
                    Step::Resolve,
                    format!(
                        "imported mesh {:?} is not active (active: {:?})",
                        mesh, active
                    ),
                ))
            }
        }

        let name = self
            .host
            .mesh_name(mesh)
            .map_err(|err| fail(link, Step::Resolve, err))?;
        tracing::info!("Processing '{}' (as '{}')", link.link, name);

        tracing::info!("Fixing up mesh pose");
        let mut pose = self
            .host
            .pose(mesh)
            .map_err(|err| fail(link, Step::Transform, err))?;

        match self.apply {
            ApplyMode::Replay => {
                for op in &link.ops {
                    tracing::debug!("Applying {}", op);
                    op.apply(&mut pose);
                }
            }
            ApplyMode::Composed => {
                tracing::debug!("Applying {:?}", link.composed);
                link.composed.apply(&mut pose);
            }
        }

        self.host
            .set_pose(mesh, pose)
            .map_err(|err| fail(link, Step::Transform, err))?;

        tracing::info!("Fixing up mesh origin");
        self.host
            .set_origin_to_reference_point(mesh)
            .map_err(|err| fail(link, Step::FixOrigin, err))?;

        let working_state = self.dirs.working_state(&link.link);
        tracing::info!("Saving working state ({})", working_state.display());
        self.host
            .save_working_state(&working_state, true)
            .map_err(|err| fail(link, Step::Save, err))?;

        let collada = self.export(link, mesh, ExportFormat::Collada)?;
        let stl = self.export(link, mesh, ExportFormat::Stl)?;

        Ok(LinkOutputs {
            link: link.link.clone(),
            applied: link.ops.clone(),
            working_state,
            collada,
            stl,
        })
    }

    fn export(
        &mut self,
        link: &AccumulatedLink,
        mesh: H::Handle,
        format: ExportFormat,
    ) -> Result<PathBuf, LinkProcessingError> {
        let path = self.dirs.export(&link.link, format);
        tracing::info!("Export mesh to {} ({})", format, path.display());
        self.host
            .export_to(mesh, &path, format)
            .map_err(|err| fail(link, Step::Export(format), err))?;
        Ok(path)
    }
}

fn fail(
    link: &AccumulatedLink,
    step: Step,
    source: impl Into<Box<dyn Error + Send + Sync>>,
) -> LinkProcessingError {
    LinkProcessingError {
        link: link.link.clone(),
        step,
        source: source.into(),
    }
}
