//! Poses chain link meshes by replaying rigid transforms declared per link.
//!
//! Every link receives the ops of all links before it in the chain followed
//! by its own, so meshes authored independently end up in one chain frame.

pub mod accum;
pub mod config;
pub mod host;
pub mod ini;
pub mod op;
pub mod parse;
pub mod pipeline;
pub mod pose;

pub use self::{
    accum::{accumulate, AccumulatedLink, ChainAccumulator},
    config::{ApplyMode, Config, ConfigError, Dirs, Layout},
    host::{ExportFormat, MeshHost},
    op::{parse_op, Axis, Op, OpTokenError, PoseTransform},
    parse::{
        load_chain_spec, parse_chain_spec, ChainSpec, ChainSpecError,
        ChainSpecWarning, LinkOps, LinkSpec, ParsedChain,
    },
    pipeline::{LinkOutputs, LinkProcessingError, Pipeline, RunSummary, Step},
    pose::{Pose, RotationMode},
};
