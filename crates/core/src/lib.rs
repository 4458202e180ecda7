//! # valuer-core
//!
//! Assembles one valuation report per request:
//!
//! ```text
//! Idle -> LoadingInputs -> Validating -> Merging -> Mapping -> Rendering -> Done
//!                \______________\___________\__________\___________\_____-> Failed
//! ```
//!
//! - **LoadingInputs** reads the schema, template and image-size table from
//!   the [`ConfigStore`] once. Any failure here is fatal.
//! - **Validating** checks each data source against the schema. Findings are
//!   collected as warnings and never stop the flow.
//! - **Merging** folds the ranked sources into one tree.
//! - **Mapping** flattens that tree into text and image token tables.
//! - **Rendering** runs the image pass, then the text pass. A failure keeps
//!   the counters gathered so far.
//!
//! Requests share nothing, so batches can run on any [`Executor`].

// Re-export foundation crates
pub use valuer_traits as traits;
pub use valuer_types as types;

mod assembler;
mod config;
mod error;
mod flow;
mod request;

pub use assembler::{ReportAssembler, ReportAssemblerBuilder};
pub use config::AssemblyConfig;
pub use error::AssemblyError;
pub use flow::{AssemblyFailure, FlowState, Progress};
pub use request::{AssemblyReport, AssemblyRequest, TemplateInput};

pub use valuer_executor::ExecutorImpl;
pub use valuer_traits::{ConfigStore, Executor, InMemoryConfigStore, StoreError, SyncExecutor};
