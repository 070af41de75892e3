//! Process, readiness and signal plumbing for the orchestrator.

pub mod config;
pub mod probe;
pub mod signal_handler;
pub mod supervisor;

pub use config::AiProvider;
pub use config::CommandLine;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use probe::POLL_INTERVAL;
pub use probe::ProbeError;
pub use probe::ReadinessProbe;
pub use probe::loopback_client;
pub use signal_handler::SignalHandler;
pub use supervisor::ChildExit;
pub use supervisor::ChildSpec;
pub use supervisor::ProcessSupervisor;
pub use supervisor::SHUTDOWN_GRACE;
pub use supervisor::SupervisorError;
