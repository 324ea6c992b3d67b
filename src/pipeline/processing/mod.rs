// Pipeline processing: normalization, type coercion, flagging, deduplication and KPIs

pub mod clean;
pub mod coerce;
pub mod dedup;
pub mod kpi;
pub mod normalize;
pub mod quality_gate;

pub use clean::RecordCleaner;
pub use dedup::{deduplicate, DuplicatePolicy};
pub use kpi::{compute_kpis, HrKpis, KpiOptions, TurnoverPeriod};
pub use quality_gate::{DefaultQualityGate, FlaggedRecord, QualityFlags, QualityGate};
