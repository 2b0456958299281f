//! Free-game promotion snapshots and their change history.
//!
//! Raw platform results are normalized into a [`snapshot::Snapshot`], compared
//! against the latest archived record by [`detect::ComparisonKey`], and, when
//! they differ, archived by [`archive::ArchiveWriter`] into a
//! [`store::HistoryStore`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod platform;
pub mod report;
pub mod snapshot;
pub mod store;
