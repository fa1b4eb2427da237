//! # bizmatch Eval
//!
//! Measures extraction quality against a labeled dataset.
//!
//! [`EvalOrchestrator`] runs every ground-truth row through the extractor
//! behind a bounded admission gate, compares each field, and asks an
//! [`ExtractionJudge`] where exact comparison is not enough. Results are
//! written as a fixed 21-column table and folded into accuracy metrics by
//! [`aggregate`].
//!
//! ```no_run
//! use bizmatch_eval::{aggregate, load_rows, write_results, EvalConfig, EvalOrchestrator, ExtractionJudge};
//! # async fn run(extractor: bizmatch_extract::Extractor, judge: ExtractionJudge) -> bizmatch_eval::Result<()> {
//! let rows = load_rows("eval_data.csv")?;
//! let orchestrator = EvalOrchestrator::new(extractor, judge, EvalConfig::default())?;
//! let results = orchestrator.run(&rows).await;
//! write_results("eval.csv", &results)?;
//! println!("{}", aggregate(&results));
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod dataset;
pub mod error;
pub mod judge;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod result;

pub use compare::{business_metrics, datetimes_equal, field_matches, values_match, BusinessScore};
pub use dataset::{decode_bytes, load_rows, GroundTruthRow};
pub use error::{EvalError, Result};
pub use judge::ExtractionJudge;
pub use metrics::{aggregate, Metric, MetricsReport};
pub use orchestrator::{EvalConfig, EvalOrchestrator, DEFAULT_CONCURRENCY};
pub use report::{read_results, write_results};
pub use result::{EvalResult, COLUMNS};
