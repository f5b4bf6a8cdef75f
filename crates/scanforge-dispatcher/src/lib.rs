//! `AnalysisDispatcher`: the per-request state machine that registers,
//! detects, fans out, aggregates, and finalizes one analysis (spec §4.7).

pub mod dispatcher;
pub mod runner_factory;

pub use dispatcher::AnalysisDispatcher;
pub use runner_factory::{RunnerFactory, StaticRunnerFactory};
pub use scanforge_core::error::DispatcherError;
