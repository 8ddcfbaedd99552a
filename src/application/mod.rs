//! Application Layer - Lifecycle management, risk monitoring, orchestration
//!
//! Wires the pure strategy layer to the ports. The lifecycle manager owns
//! position state transitions, the exit monitor enforces thresholds and the
//! daily loss governor, and the orchestrator drives both on timers.

pub mod lifecycle;
pub mod monitor;
pub mod orchestrator;

pub use lifecycle::{LifecycleConfig, LifecycleError, PositionManager, RecoveryOutcome};
pub use monitor::{ExitMonitor, MonitorAction};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
