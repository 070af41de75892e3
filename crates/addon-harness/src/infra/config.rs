//! Orchestrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use addon_harness_common::env_string;
use addon_harness_common::parse_env_u16;
use addon_harness_common::parse_env_u64;
use clap::ValueEnum;
use thiserror::Error;

use crate::fixture_server::DEFAULT_MOCK_PORT;

const DEFAULT_SERVICE_PORT: u16 = 7000;
const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_ENCRYPTION_KEY: &str = "e2e-harness-key-0123456789abcdef";
const DEFAULT_SERVICE_COMMAND: &str = "node server.js";
const FIXTURE_BINARY: &str = "fixture-server";

const AI_PROVIDER_ENV: &str = "E2E_AI_PROVIDER";

/// Which AI provider profile the validation step exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AiProvider {
    #[default]
    OpenaiCompat,
    Gemini,
}

impl AiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::OpenaiCompat => "openai-compat",
            AiProvider::Gemini => "gemini",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidProvider {
            value: value.to_string(),
        };
        <Self as ValueEnum>::from_str(value.trim(), true).map_err(|_| invalid())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid AI provider '{value}'; expected openai-compat or gemini")]
    InvalidProvider { value: String },
    #[error("Invalid command line in {key}: {message}")]
    InvalidCommand { key: &'static str, message: String },
    #[error("Command line in {key} is empty")]
    EmptyCommand { key: &'static str },
    #[error("Cannot locate the fixture-server binary: {0}")]
    FixtureBinary(#[source] std::io::Error),
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn parse(key: &'static str, line: &str) -> Result<Self, ConfigError> {
        let words = shell_words::split(line).map_err(|e| ConfigError::InvalidCommand {
            key,
            message: e.to_string(),
        })?;
        let mut words = words.into_iter();
        let program = words.next().ok_or(ConfigError::EmptyCommand { key })?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    mock_port: u16,
    service_port: u16,
    ai_provider: AiProvider,
    encryption_key: String,
    service_command: CommandLine,
    fixture_command: Option<CommandLine>,
    startup_timeout: Duration,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let ai_provider = match env_string(AI_PROVIDER_ENV) {
            Some(value) => AiProvider::parse(&value)?,
            None => AiProvider::default(),
        };
        let service_command = CommandLine::parse(
            "E2E_SERVICE_CMD",
            &env_string("E2E_SERVICE_CMD").unwrap_or_else(|| DEFAULT_SERVICE_COMMAND.to_string()),
        )?;
        let fixture_command = env_string("E2E_FIXTURE_CMD")
            .map(|line| CommandLine::parse("E2E_FIXTURE_CMD", &line))
            .transpose()?;

        Ok(Self {
            mock_port: parse_env_u16("MOCK_PORT", DEFAULT_MOCK_PORT),
            service_port: parse_env_u16("PORT", DEFAULT_SERVICE_PORT),
            ai_provider,
            encryption_key: env_string("ENCRYPTION_KEY")
                .unwrap_or_else(|| DEFAULT_ENCRYPTION_KEY.to_string()),
            service_command,
            fixture_command,
            startup_timeout: Duration::from_millis(parse_env_u64(
                "E2E_STARTUP_TIMEOUT_MS",
                DEFAULT_STARTUP_TIMEOUT_MS,
            )),
        })
    }

    pub fn mock_port(&self) -> u16 {
        self.mock_port
    }

    pub fn service_port(&self) -> u16 {
        self.service_port
    }

    pub fn ai_provider(&self) -> AiProvider {
        self.ai_provider
    }

    pub fn encryption_key(&self) -> &str {
        &self.encryption_key
    }

    pub fn service_command(&self) -> &CommandLine {
        &self.service_command
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    pub fn fixture_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.mock_port)
    }

    pub fn service_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.service_port)
    }

    /// `E2E_FIXTURE_CMD` when set, otherwise the `fixture-server` binary next to this executable.
    pub fn fixture_command(&self) -> Result<CommandLine, ConfigError> {
        if let Some(command) = &self.fixture_command {
            return Ok(command.clone());
        }
        let exe = std::env::current_exe().map_err(ConfigError::FixtureBinary)?;
        let file_name = format!("{FIXTURE_BINARY}{}", std::env::consts::EXE_SUFFIX);
        let binary: PathBuf = exe.with_file_name(file_name);
        Ok(CommandLine {
            program: binary.to_string_lossy().into_owned(),
            args: Vec::new(),
        })
    }

    pub fn with_ai_provider(mut self, provider: AiProvider) -> Self {
        self.ai_provider = provider;
        self
    }

    pub fn with_ports(mut self, mock_port: u16, service_port: u16) -> Self {
        self.mock_port = mock_port;
        self.service_port = service_port;
        self
    }

    pub fn with_service_command(mut self, command: CommandLine) -> Self {
        self.service_command = command;
        self
    }

    pub fn with_fixture_command(mut self, command: CommandLine) -> Self {
        self.fixture_command = Some(command);
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}
