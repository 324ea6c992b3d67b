// Observability: run metrics recorded per pipeline stage

pub mod metrics;

pub use metrics::{init, render, MetricName};
