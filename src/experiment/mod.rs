//! Experiment data model
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentGroup (family, variant) ──1:1── GroupData
//!                                             │
//!                                             ├── RunFile (latest by timestamp)
//!                                             └──< Record (N) [file order]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_perflog::experiment::{select_latest, Record, RunFile};
//! use trueno_perflog::timestamp::TimestampResolver;
//!
//! let resolver = TimestampResolver::with_year(2025);
//! let latest = select_latest(vec![
//!     RunFile::resolve("independent_cpu_aff_03_04_185131.txt", &resolver),
//!     RunFile::resolve("independent_cpu_aff_03_04_190000.txt", &resolver),
//! ])
//! .unwrap();
//! assert!(latest.path().ends_with("independent_cpu_aff_03_04_190000.txt"));
//!
//! let record = Record::throughput(4, 7, 182.5);
//! assert_eq!(record.metric(), "Throughput");
//! ```

mod group;
mod record;
mod run_file;
mod store;

pub use group::{ExperimentGroup, GroupData};
pub use record::{Record, THROUGHPUT_METRIC};
pub use run_file::{select_latest, RunFile};
pub use store::ExperimentSet;
