//! Wires the supervisor, probes and scenarios into one run.

use std::future::Future;

use anyhow::Context;
use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::infra::ChildSpec;
use crate::infra::HarnessConfig;
use crate::infra::ProbeError;
use crate::infra::ProcessSupervisor;
use crate::infra::ReadinessProbe;
use crate::infra::loopback_client;
use crate::infra::signal_handler::interrupted;
use crate::scenario::ScenarioContext;
use crate::scenario::ScenarioReport;
use crate::scenario::ScenarioRunner;
use crate::scenario::ServiceClient;

pub const FIXTURE_CHILD: &str = "fixtures";
pub const SERVICE_CHILD: &str = "service";

#[derive(Debug, thiserror::Error)]
#[error("Interrupted by signal")]
pub struct Interrupted;

pub fn child_specs(config: &HarnessConfig) -> Result<[ChildSpec; 2]> {
    let fixture_base = config.fixture_base_url();
    let fixture = ChildSpec::new(FIXTURE_CHILD, &config.fixture_command()?)
        .env("MOCK_PORT", config.mock_port().to_string());
    let service = ChildSpec::new(SERVICE_CHILD, config.service_command())
        .env("PORT", config.service_port().to_string())
        .env("ENCRYPTION_KEY", config.encryption_key())
        .env("TMDB_API_BASE_URL", format!("{fixture_base}/3"))
        .env("OPENAI_COMPAT_BASE_URL", format!("{fixture_base}/v1"));
    Ok([fixture, service])
}

/// Starts both children, runs the scenarios and always shuts the children down.
pub async fn run(
    config: &HarnessConfig,
    signals: watch::Receiver<bool>,
) -> Result<ScenarioReport> {
    let specs = child_specs(config)?;
    let mut supervisor = ProcessSupervisor::start(specs)
        .await
        .context("failed to start child processes")?;

    let result = tokio::select! {
        result = drive(config, &mut supervisor) => result,
        () = interrupted(signals) => Err(Interrupted.into()),
    };

    if result.is_err() {
        warn!("Run failed; stopping children");
    }
    supervisor.shutdown().await;
    result
}

async fn drive(
    config: &HarnessConfig,
    supervisor: &mut ProcessSupervisor,
) -> Result<ScenarioReport> {
    let http = loopback_client();
    let probe = ReadinessProbe::new(http.clone());
    let timeout = config.startup_timeout();
    let fixture_base = config.fixture_base_url();
    let service_base = config.service_base_url();

    let fixture_url = format!("{fixture_base}/3/configuration?api_key=mock");
    let elapsed = until_child_exit(supervisor, probe.wait_until_ready(&fixture_url, timeout))
        .await
        .context("fixture server did not become ready")?;
    info!(
        child = FIXTURE_CHILD,
        elapsed_ms = elapsed.as_millis(),
        "Child ready"
    );

    let service_url = format!("{service_base}/configure");
    let elapsed = until_child_exit(supervisor, probe.wait_until_ready(&service_url, timeout))
        .await
        .context("service did not become ready")?;
    info!(
        child = SERVICE_CHILD,
        elapsed_ms = elapsed.as_millis(),
        "Child ready"
    );

    let base_url = Url::parse(&service_base)
        .with_context(|| format!("invalid service URL {service_base}"))?;
    let runner = ScenarioRunner::new(ServiceClient::new(http, base_url));
    let context = ScenarioContext::new(config.ai_provider(), fixture_base);
    let report = until_child_exit(supervisor, runner.run(context))
        .await
        .context("scenario run failed")?;
    Ok(report)
}

/// Resolves with `work`, unless a supervised child exits first.
async fn until_child_exit<T, E>(
    supervisor: &mut ProcessSupervisor,
    work: impl Future<Output = Result<T, E>>,
) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::select! {
        result = work => Ok(result?),
        exit = supervisor.wait_any_exit() => {
            let exit = exit?;
            Err(ProbeError::ChildExited {
                name: exit.name,
                status: exit.status,
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    #[cfg(unix)]
    use crate::fixture_server::FixtureServerConfig;
    #[cfg(unix)]
    use crate::fixture_server::start_fixture_server;
    use crate::infra::AiProvider;
    use crate::infra::CommandLine;
    #[cfg(unix)]
    use crate::scenario::Step;
    #[cfg(unix)]
    use crate::scenario::fake_service;
    use addon_harness_common::test_support::EnvGuard;
    use addon_harness_common::test_support::env_lock;

    fn config() -> HarnessConfig {
        let _lock = env_lock();
        let _guards: Vec<EnvGuard> = [
            "MOCK_PORT",
            "PORT",
            "E2E_AI_PROVIDER",
            "ENCRYPTION_KEY",
            "E2E_SERVICE_CMD",
            "E2E_FIXTURE_CMD",
            "E2E_STARTUP_TIMEOUT_MS",
        ]
        .into_iter()
        .map(EnvGuard::remove)
        .collect();
        HarnessConfig::from_env().unwrap()
    }

    fn sh(script: &str) -> CommandLine {
        CommandLine {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    /// Per-test directory where children record their pid.
    #[cfg(unix)]
    struct PidDir {
        dir: PathBuf,
    }

    #[cfg(unix)]
    impl PidDir {
        fn new(test: &str) -> Self {
            let name = format!("addon-harness-{test}-{}", std::process::id());
            let dir = std::env::temp_dir().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn path(&self, child: &str) -> PathBuf {
            self.dir.join(format!("{child}.pid"))
        }

        fn paths(&self) -> Vec<PathBuf> {
            vec![self.path(FIXTURE_CHILD), self.path(SERVICE_CHILD)]
        }

        /// Writes the shell's pid, then becomes a long sleep under that pid.
        fn sleeper(&self, child: &str) -> CommandLine {
            let path = self.path(child);
            sh(&format!("echo $$ > '{}'; exec sleep 30", path.display()))
        }
    }

    #[cfg(unix)]
    impl Drop for PidDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[cfg(unix)]
    async fn wait_for_pids(paths: &[PathBuf]) -> Vec<libc::pid_t> {
        loop {
            let pids: Vec<libc::pid_t> = paths
                .iter()
                .filter_map(|path| std::fs::read_to_string(path).ok()?.trim().parse().ok())
                .collect();
            if pids.len() == paths.len() {
                return pids;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[cfg(unix)]
    fn is_running(pid: libc::pid_t) -> bool {
        // SAFETY: signal 0 only checks that the process exists.
        unsafe { libc::kill(pid, 0) == 0 }
    }

    #[test]
    fn test_child_env_points_service_at_fixtures() {
        let config = config()
            .with_ports(4555, 7555)
            .with_fixture_command(sh("true"));
        let [fixture, service] = child_specs(&config).unwrap();

        assert_eq!(fixture.name, FIXTURE_CHILD);
        assert_eq!(
            fixture.env,
            vec![("MOCK_PORT".to_string(), "4555".to_string())]
        );

        let env = |key: &str| {
            service
                .env
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(service.name, SERVICE_CHILD);
        assert_eq!(service.program, "node");
        assert_eq!(env("PORT").as_deref(), Some("7555"));
        assert_eq!(
            env("TMDB_API_BASE_URL").as_deref(),
            Some("http://127.0.0.1:4555/3")
        );
        assert_eq!(
            env("OPENAI_COMPAT_BASE_URL").as_deref(),
            Some("http://127.0.0.1:4555/v1")
        );
        assert!(env("ENCRYPTION_KEY").is_some_and(|k| !k.is_empty()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_full_run_passes_every_step_and_stops_children() {
        let fixtures = start_fixture_server(FixtureServerConfig::with_port(0))
            .await
            .unwrap();
        let service_port = free_port();
        let pid_dir = PidDir::new("full-run");
        let config = config()
            .with_ports(fixtures.local_addr().port(), service_port)
            .with_fixture_command(pid_dir.sleeper(FIXTURE_CHILD))
            .with_service_command(pid_dir.sleeper(SERVICE_CHILD))
            .with_startup_timeout(Duration::from_secs(20));

        // The service comes up only once both children are running.
        let paths = pid_dir.paths();
        let service = tokio::spawn(async move {
            let pids = wait_for_pids(&paths).await;
            let service = fake_service::start_on(service_port, Default::default()).await;
            (pids, service)
        });

        let (_tx, rx) = watch::channel(false);
        let report = run(&config, rx).await.unwrap();
        let (pids, _service) = service.await.unwrap();

        let ran: Vec<Step> = report.outcomes.iter().map(|o| o.step).collect();
        assert_eq!(ran, Step::ALL.to_vec());
        assert_eq!(
            report.context.config_id.as_deref(),
            Some(fake_service::CONFIG_ID)
        );
        for pid in pids {
            assert!(!is_running(pid), "child {pid} still running");
        }
        fixtures.shutdown().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_exit_during_probe_fails_fast() {
        let config = config()
            .with_ports(free_port(), free_port())
            .with_ai_provider(AiProvider::OpenaiCompat)
            .with_fixture_command(sh("sleep 30"))
            .with_service_command(sh("exit 3"))
            .with_startup_timeout(Duration::from_secs(20));
        let (_tx, rx) = watch::channel(false);

        let started = std::time::Instant::now();
        let err = run(&config, rx).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        let exited = err
            .chain()
            .find_map(|e| e.downcast_ref::<ProbeError>())
            .unwrap();
        assert!(matches!(
            exited,
            ProbeError::ChildExited { name, .. } if name == SERVICE_CHILD
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_interrupts_run_and_stops_children() {
        let pid_dir = PidDir::new("interrupt");
        let config = config()
            .with_ports(free_port(), free_port())
            .with_fixture_command(pid_dir.sleeper(FIXTURE_CHILD))
            .with_service_command(pid_dir.sleeper(SERVICE_CHILD));
        let (tx, rx) = watch::channel(false);
        let paths = pid_dir.paths();
        let signaller = tokio::spawn(async move {
            let pids = wait_for_pids(&paths).await;
            let _ = tx.send(true);
            pids
        });

        let err = run(&config, rx).await.unwrap_err();
        assert!(err.downcast_ref::<Interrupted>().is_some(), "{err:?}");
        for pid in signaller.await.unwrap() {
            assert!(!is_running(pid), "child {pid} still running");
        }
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }
}
