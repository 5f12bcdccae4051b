mod configuration;
mod data;
mod exposition;
mod lock;
mod registry;
mod sampler;

pub use self::{
    configuration::Configuration,
    data::{Counter, Distribution, Gauge, Key, Label, MetricValue, Snapshot, Statistics},
    exposition::{render_text, write_text},
    registry::{GroupId, Registry},
    sampler::{Controller, Sampler},
};
