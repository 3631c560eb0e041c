//! Batch runs against scripted in-memory devices.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use netfleet::fleet::{
    BatchOrchestrator, CommandRenderer, Connector, CredentialSet, DescriptionRules, DeviceRunner, DeviceSession,
    DeviceSpec, DeviceState, DeviceStatus, ReportWriter, Task, Vars,
};
use netfleet::{AlgorithmPolicy, AuthMethod, DeviceError};

#[derive(Clone, Default)]
enum Behavior {
    #[default]
    Healthy,
    FailOpen(DeviceError),
    SlowOpen(Duration),
    Hang,
}

type Events = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct ScriptedConnector {
    behaviors: HashMap<String, Behavior>,
    events: Events,
}

impl ScriptedConnector {
    fn with(mut self, device: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(device.to_string(), behavior);
        self
    }
}

fn events_for(events: &Events, device: &str) -> Vec<String> {
    let prefix = format!("{}: ", device);
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

struct ScriptedSession {
    device: String,
    hang: bool,
    events: Events,
}

impl ScriptedSession {
    fn record(&self, event: impl AsRef<str>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}: {}", self.device, event.as_ref()));
    }
}

impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn open(
        &self,
        device: &DeviceSpec,
        _credentials: &CredentialSet,
        _policy: &AlgorithmPolicy,
    ) -> Result<ScriptedSession, DeviceError> {
        let behavior = self.behaviors.get(&device.name).cloned().unwrap_or_default();
        match behavior {
            Behavior::FailOpen(e) => return Err(e),
            Behavior::SlowOpen(delay) => tokio::time::sleep(delay).await,
            Behavior::Healthy | Behavior::Hang => {}
        }

        let session = ScriptedSession {
            device: device.name.clone(),
            hang: matches!(behavior, Behavior::Hang),
            events: self.events.clone(),
        };
        session.record("open");
        Ok(session)
    }
}

impl DeviceSession for ScriptedSession {
    async fn run_command(&mut self, command: &str) -> Result<String, DeviceError> {
        self.record(format!("exec {}", command));
        Ok(String::new())
    }

    async fn send_config(&mut self, commands: &[String], applied: &mut Vec<String>) -> Result<(), DeviceError> {
        for command in commands {
            self.record(format!("config {}", command));
            applied.push(command.clone());
        }
        Ok(())
    }

    async fn save_config(&mut self) -> Result<(), DeviceError> {
        self.record("save");
        Ok(())
    }

    async fn running_config(&mut self) -> Result<String, DeviceError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(format!("hostname {}\n!\nend", self.device))
    }

    async fn close(self) {
        self.record("close");
    }
}

fn credentials() -> CredentialSet {
    CredentialSet::new("admin", AuthMethod::Password(SecretString::from("cisco".to_string())))
}

fn fleet() -> Vec<DeviceSpec> {
    vec![
        DeviceSpec::new("R1", "172.31.21.4").with_commands(["hostname R1"]),
        DeviceSpec::new("R2", "172.31.21.5").with_commands(["hostname R2"]),
        DeviceSpec::new("R3", "172.31.21.6").with_commands(["hostname R3"]),
    ]
}

fn runner(task: Task) -> DeviceRunner {
    DeviceRunner::new(task, CommandRenderer::new(Vars::new()), DescriptionRules::default())
}

fn names(report: &netfleet::BatchReport) -> Vec<&str> {
    report.outcomes.iter().map(|o| o.device.as_str()).collect()
}

#[tokio::test]
async fn test_auth_failure_does_not_stop_batch() {
    let connector = ScriptedConnector::default().with(
        "R2",
        Behavior::FailOpen(DeviceError::Authentication("Authentication failed for user 'admin'".into())),
    );
    let batch = BatchOrchestrator::new(connector, runner(Task::Configure));

    let report = batch.run(&fleet(), &credentials(), &AlgorithmPolicy::default()).await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(names(&report), vec!["R1", "R2", "R3"]);
    assert_eq!(report.outcomes[1].error.as_ref().map(DeviceError::kind), Some("AuthenticationError"));
    assert!(report.outcomes[1].applied_commands.is_empty());
    assert_eq!(report.outcomes[2].status, DeviceStatus::Succeeded);
    assert_eq!(report.outcomes[2].applied_commands, vec!["hostname R3"]);
}

#[tokio::test]
async fn test_timeout_on_second_device() {
    let connector = ScriptedConnector::default().with(
        "R2",
        Behavior::FailOpen(DeviceError::Timeout(Duration::from_secs(20))),
    );
    let batch = BatchOrchestrator::new(connector, runner(Task::Backup));

    let report = batch.run(&fleet(), &credentials(), &AlgorithmPolicy::default()).await;

    assert_eq!(report.outcomes.len(), 3);
    let r2 = &report.outcomes[1];
    assert_eq!(r2.status, DeviceStatus::Failed);
    assert_eq!(r2.error, Some(DeviceError::Timeout(Duration::from_secs(20))));
    assert_eq!(r2.failed_at, Some(DeviceState::Connecting));

    for outcome in [&report.outcomes[0], &report.outcomes[2]] {
        assert_eq!(outcome.status, DeviceStatus::Succeeded);
        assert!(!outcome.output.is_empty());
    }
}

#[tokio::test]
async fn test_parallel_run_keeps_inventory_order() {
    let connector = ScriptedConnector::default()
        .with("R1", Behavior::SlowOpen(Duration::from_millis(60)))
        .with("R2", Behavior::SlowOpen(Duration::from_millis(30)));
    let batch = BatchOrchestrator::new(connector, runner(Task::Backup)).with_jobs(3);

    let report = batch.run(&fleet(), &credentials(), &AlgorithmPolicy::default()).await;

    assert_eq!(names(&report), vec!["R1", "R2", "R3"]);
    assert_eq!(report.succeeded(), 3);
}

#[tokio::test]
async fn test_undefined_template_variable_submits_nothing() {
    let mut renderer = CommandRenderer::new(Vars::new());
    renderer
        .add_template("router.j2", "hostname {{ name }}\nrouter ospf {{ ospf_process }}\n")
        .unwrap();
    let connector = ScriptedConnector::default();
    let events = connector.events.clone();
    let batch = BatchOrchestrator::new(
        connector,
        DeviceRunner::new(Task::Configure, renderer, DescriptionRules::default()),
    );

    let devices = vec![
        DeviceSpec::new("R1", "172.31.21.4").with_template("router.j2"),
        DeviceSpec::new("R2", "172.31.21.5")
            .with_template("router.j2")
            .with_var("ospf_process", "10"),
    ];
    let report = batch.run(&devices, &credentials(), &AlgorithmPolicy::default()).await;

    let r1 = &report.outcomes[0];
    assert!(matches!(r1.error, Some(DeviceError::TemplateRender { .. })));
    assert!(r1.applied_commands.is_empty());
    assert_eq!(events_for(&events, "R1"), vec!["open", "close"]);

    let r2 = &report.outcomes[1];
    assert_eq!(r2.applied_commands, vec!["hostname R2", "router ospf 10"]);
    assert!(r2.saved);
}

#[tokio::test]
async fn test_template_failure_closes_session_without_config() {
    let connector = ScriptedConnector::default();
    let events = connector.events.clone();
    let batch = BatchOrchestrator::new(connector, runner(Task::Configure));

    let devices = vec![DeviceSpec::new("R1", "172.31.21.4").with_template("missing.j2")];
    let report = batch.run(&devices, &credentials(), &AlgorithmPolicy::default()).await;

    assert_eq!(report.outcomes[0].failed_at, Some(DeviceState::Configuring));
    assert_eq!(*events.lock().unwrap(), vec!["R1: open", "R1: close"]);
}

#[tokio::test]
async fn test_cancel_closes_in_flight_and_reports_the_rest() {
    let connector = ScriptedConnector::default().with("R1", Behavior::Hang);
    let events = connector.events.clone();
    let cancel = CancellationToken::new();
    let batch = BatchOrchestrator::new(connector, runner(Task::Backup)).with_cancellation(cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = batch.run(&fleet(), &credentials(), &AlgorithmPolicy::default()).await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.error == Some(DeviceError::Cancelled)));
    assert_eq!(report.outcomes[0].failed_at, Some(DeviceState::Connected));
    assert_eq!(report.outcomes[1].failed_at, Some(DeviceState::Pending));
    assert_eq!(report.outcomes[2].failed_at, Some(DeviceState::Pending));

    assert_eq!(events_for(&events, "R1"), vec!["open", "close"]);
    assert!(events_for(&events, "R2").is_empty());
}

#[tokio::test]
async fn test_report_lists_every_device() {
    let connector = ScriptedConnector::default().with(
        "R2",
        Behavior::FailOpen(DeviceError::Network("Connection failed to 172.31.21.5:22".into())),
    );
    let batch = BatchOrchestrator::new(connector, runner(Task::Backup));
    let report = batch.run(&fleet(), &credentials(), &AlgorithmPolicy::default()).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.txt");
    ReportWriter::new(&path).write(&report).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[ Configuration for R1 (172.31.21.4) ]"));
    assert!(text.contains("[ FAILED: R2 (172.31.21.5) ]"));
    assert!(text.contains("Error: NetworkError"));
    assert!(text.contains("[ Configuration for R3 (172.31.21.6) ]"));
    assert!(text.contains("hostname R3"));
    assert!(text.contains("3 devices: 2 succeeded, 1 failed"));
}
