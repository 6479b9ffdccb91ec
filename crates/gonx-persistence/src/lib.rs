//! Persistence layer for gonx.
//!
//! Benchmark history lives in one JSON array file per analyser, newest
//! record first. Files are replaced atomically (write to a temp file in the
//! same directory, then rename) so an interrupted write never leaves a
//! truncated history behind.
//!
//! There is no file locking: two processes appending to the same history
//! file at once race, and the last writer wins on the whole array.
//!
//! # Example
//!
//! ```no_run
//! use gonx_models::AnalyserKind;
//! use gonx_persistence::{RecordFilter, ResultStore};
//!
//! let store = ResultStore::new("/path/to/repo/.gonx/benchmarks");
//! let records = store.load_all(AnalyserKind::Build).unwrap();
//! let baseline = RecordFilter::new("baseline").apply(records);
//! println!("{} baseline runs", baseline.len());
//! ```

pub mod atomic;
pub mod error;
pub mod filter;
pub mod result_store;

pub use error::{PersistenceError, Result};
pub use filter::RecordFilter;
pub use result_store::ResultStore;
