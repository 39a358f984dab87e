//! Blood-pressure reading pipeline.
//!
//! `classifier` and `zscore` are pure. `ingest` and `query` are the two
//! workflows the HTTP layer drives; both take a borrowed SQLite connection
//! and run on a blocking thread.

pub mod classifier;
pub mod ingest;
pub mod policy;
pub mod query;
pub mod window;
pub mod zscore;

pub use classifier::{classify, ClinicalClassifier};
pub use ingest::{
    AlertOutcome, IngestError, IngestOutcome, IngestionWorkflow, ReadingSubmission,
    SubmittedTimestamp,
};
pub use policy::AlertPolicy;
pub use query::{query_readings, QueryError};
pub use window::{TimeFilter, TimeWindow, WindowError, WindowQuery};
pub use zscore::{annotate, summarize, ScoredReading, WindowStats};
