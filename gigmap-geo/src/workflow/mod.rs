//! Sequential resolution workflow and dataset builders

pub mod pipeline;
pub mod resolver;

pub use pipeline::{build_listing, MapPipeline, RunReport, UnresolvedEvent};
pub use resolver::{Resolution, ResolutionStage, Resolver};
