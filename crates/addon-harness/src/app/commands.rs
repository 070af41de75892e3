use clap::Parser;

use crate::infra::AiProvider;

const LONG_ABOUT: &str = "\
Boot the fixture server and the addon service, wait for both to answer,\n\
then run the end-to-end scenarios in order and stop at the first failure.\n\
\n\
Both children are terminated on success, failure and SIGINT/SIGTERM.";

const AFTER_LONG_HELP: &str = r#"ENVIRONMENT:
    MOCK_PORT               Fixture server port (default 4010)
    PORT                    Service port (default 7000)
    E2E_AI_PROVIDER         openai-compat or gemini (default openai-compat)
    ENCRYPTION_KEY          Passed to the service
    E2E_SERVICE_CMD         Service command line (default "node server.js")
    E2E_FIXTURE_CMD         Fixture command line (default: sibling fixture-server)
    E2E_STARTUP_TIMEOUT_MS  Readiness timeout per child (default 30000)

EXIT STATUS:
    0  every scenario passed
    1  a scenario, probe or child failed, or the run was interrupted"#;

#[derive(Debug, Parser)]
#[command(
    name = "addon-harness",
    version,
    about = "Run the addon service end-to-end against deterministic fixtures",
    long_about = LONG_ABOUT,
    after_long_help = AFTER_LONG_HELP
)]
pub struct Cli {
    /// AI provider profile to validate; overrides E2E_AI_PROVIDER
    #[arg(long, value_enum, value_name = "PROVIDER")]
    pub ai_provider: Option<AiProvider>,

    /// Debug-level harness logs
    #[arg(short, long, env = "HARNESS_VERBOSE")]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(
    name = "fixture-server",
    version,
    about = "Serve canned metadata and chat-completion responses on 127.0.0.1"
)]
pub struct FixtureServerCli {
    /// Listen port; overrides MOCK_PORT (0 picks a free port)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Debug-level request logs
    #[arg(short, long, env = "HARNESS_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

impl FixtureServerCli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
