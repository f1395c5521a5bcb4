//! Crime incident severity prediction and hotspot analysis
//!
//! The crate trains a small pipeline from a historical incident CSV:
//! categorical encoders, a multi-class severity classifier, and a k-means
//! hotspot clusterer. All trained state is owned by an immutable
//! `TrainedPipeline` built once at startup.

pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
