//! Application Layer - Use cases wired over the ports
//!
//! - `executor`: chunked order execution toward a goal
//! - `controller`: per-tick mode decisions
//! - `scheduler`: fixed-cadence loop with fault isolation
//! - `shutdown`: cancellation channel

pub mod executor;
pub mod controller;
pub mod scheduler;
pub mod shutdown;

pub use executor::{ChunkedExecutor, ExecutionOutcome, ExecutionReport, ExecutorConfig, ExecutorError};
pub use controller::{ControllerConfig, ControllerError, ModeController, MonitorReport, TickReport};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerSummary};
pub use shutdown::{shutdown_channel, ShutdownHandle, ShutdownSignal};
