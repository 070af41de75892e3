#![expect(clippy::print_stdout, reason = "CLI output is emitted here")]
#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

//! Composition roots for the two binaries.

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing::info;

pub mod commands;
pub mod orchestrator;

use addon_harness_common::telemetry;

use crate::app::commands::Cli;
use crate::app::commands::FixtureServerCli;
use crate::app::orchestrator::Interrupted;
use crate::fixture_server::FixtureServerConfig;
use crate::fixture_server::start_fixture_server;
use crate::infra::HarnessConfig;
use crate::infra::SignalHandler;
use crate::infra::signal_handler::interrupted;
use crate::scenario::ScenarioError;
use crate::scenario::ScenarioReport;

mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

const PROGRAM_NAME: &str = "addon-harness";

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}

fn find_error<T: std::error::Error + 'static>(err: &anyhow::Error) -> Option<&T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

pub struct Application;

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(report) => {
                print_report(&report);
                exit_codes::SUCCESS
            }
            Err(e) => self.handle_error(e),
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<ScenarioReport> {
        let cli = Cli::parse();
        let _telemetry = telemetry::init_tracing(cli.log_level());

        let mut config = HarnessConfig::from_env().context("invalid harness configuration")?;
        if let Some(provider) = cli.ai_provider {
            config = config.with_ai_provider(provider);
        }
        debug!(
            ai_provider = config.ai_provider().as_str(),
            mock_port = config.mock_port(),
            service_port = config.service_port(),
            timeout_ms = config.startup_timeout().as_millis(),
            "Configuration loaded"
        );

        let signals = SignalHandler::setup()?;
        let runtime = current_thread_runtime()?;
        runtime.block_on(orchestrator::run(&config, signals.subscribe()))
    }

    fn handle_error(&self, e: anyhow::Error) -> i32 {
        if find_error::<Interrupted>(&e).is_some() {
            eprintln!("{PROGRAM_NAME}: interrupted; children stopped");
        } else if let Some(scenario) = find_error::<ScenarioError>(&e) {
            eprintln!("{PROGRAM_NAME}: FAILED at {}", scenario.step());
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("{PROGRAM_NAME}: Error: {e:?}");
        }
        exit_codes::FAILURE
    }
}

fn print_report(report: &ScenarioReport) {
    for outcome in &report.outcomes {
        println!(
            "ok  {:<18} {:>6}ms  {}",
            outcome.step.name(),
            outcome.elapsed.as_millis(),
            outcome.step.description()
        );
    }
    println!(
        "{} scenarios passed in {}ms",
        report.outcomes.len(),
        report.total().as_millis()
    );
}

/// Runs the fixture server in the foreground until SIGINT/SIGTERM.
pub struct FixtureServerApplication;

impl Default for FixtureServerApplication {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureServerApplication {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => {
                eprintln!("fixture-server: Error: {e:?}");
                exit_codes::FAILURE
            }
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<()> {
        let cli = FixtureServerCli::parse();
        let _telemetry = telemetry::init_tracing(cli.log_level());
        let config = match cli.port {
            Some(port) => FixtureServerConfig::with_port(port),
            None => FixtureServerConfig::from_env(),
        };

        let signals = SignalHandler::setup()?;
        let runtime = current_thread_runtime()?;
        runtime.block_on(async {
            let server = start_fixture_server(config)
                .await
                .context("failed to start fixture server")?;
            interrupted(signals.subscribe()).await;
            info!(addr = %server.local_addr(), "Stopping fixture server");
            server.shutdown().await?;
            Ok(())
        })
    }
}
