use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forcecli::commands::lightning_event::{
    DirFileNameSelection, LightningEventCreate, event_document_path,
};
use forcecli::commands::source_deploy::{SourceDeploy, SourcePush};
use forcecli::commands::{Command, CommandExecutor, CommandOutput};
use forcecli::error::ForceCliError;
use forcecli::parsers::deploy::DeployOutcome;

/// Executor that records each call and replays a canned output.
struct FakeExecutor {
    output: CommandOutput,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeExecutor {
    fn new(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            output: CommandOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for FakeExecutor {
    async fn execute(&self, command: &Command, cwd: &Path) -> Result<CommandOutput, ForceCliError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), cwd.to_path_buf()));
        Ok(self.output.clone())
    }
}

/// Executor whose process could not be started.
struct BrokenExecutor;

impl CommandExecutor for BrokenExecutor {
    async fn execute(&self, _: &Command, _: &Path) -> Result<CommandOutput, ForceCliError> {
        Err(ForceCliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "sfdx not found",
        )))
    }
}

// ---------------------------------------------------------------------------
// force:lightning:event:create
// ---------------------------------------------------------------------------

#[test]
fn lightning_event_command_shape() {
    let selection = DirFileNameSelection::new("MyEvent", "force-app/main/default/aura");
    let cmd = LightningEventCreate::new("sfdx").build(&selection);

    assert_eq!(
        cmd.to_string(),
        "sfdx force:lightning:event:create --eventname MyEvent --outputdir force-app/main/default/aura"
    );
    assert_eq!(cmd.description.as_deref(), Some("Create Lightning Event"));
    assert_eq!(cmd.log_name.as_deref(), Some("force_lightning_event_create"));
}

#[test]
fn event_document_lives_in_its_bundle() {
    let selection = DirFileNameSelection::new("My.Event", "aura");
    let path = event_document_path(Path::new("/ws"), &selection);
    assert_eq!(path, PathBuf::from("/ws/aura/My.Event/My.Event.evt"));
}

#[tokio::test]
async fn successful_create_returns_document_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(0, "target dir = aura\n", "");
    let selection = DirFileNameSelection::new("MyEvent", "aura");

    let opened = LightningEventCreate::new("sfdx")
        .run(&executor, dir.path(), &selection)
        .await
        .unwrap();

    assert_eq!(opened, Some(dir.path().join("aura/MyEvent/MyEvent.evt")));
    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, dir.path(), "command must run in the workspace");
}

#[tokio::test]
async fn failed_create_opens_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(1, "", "ERROR: outputdir must be an aura directory");
    let selection = DirFileNameSelection::new("MyEvent", "lwc");

    let opened = LightningEventCreate::new("sfdx")
        .run(&executor, dir.path(), &selection)
        .await
        .unwrap();
    assert_eq!(opened, None);
}

#[tokio::test]
async fn missing_workspace_opens_nothing() {
    let executor = FakeExecutor::new(0, "", "");
    let selection = DirFileNameSelection::new("MyEvent", "aura");

    let opened = LightningEventCreate::new("sfdx")
        .run(&executor, Path::new("/nonexistent/forcecli-workspace"), &selection)
        .await
        .unwrap();
    assert_eq!(opened, None);
}

#[tokio::test]
async fn existing_bundle_is_refused_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("aura/MyEvent")).unwrap();
    let executor = FakeExecutor::new(0, "", "");
    let selection = DirFileNameSelection::new("MyEvent", "aura");

    let err = LightningEventCreate::new("sfdx")
        .run(&executor, dir.path(), &selection)
        .await
        .unwrap_err();
    assert!(matches!(err, ForceCliError::PathExists(_)), "got {err:?}");
    assert!(executor.calls().is_empty(), "CLI must not run");

    let opened = LightningEventCreate::new("sfdx")
        .allow_overwrite(true)
        .run(&executor, dir.path(), &selection)
        .await
        .unwrap();
    assert!(opened.is_some());
}

#[tokio::test]
async fn path_like_event_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let executor = FakeExecutor::new(0, "", "");
    let selection = DirFileNameSelection::new("../escape", "aura");

    let err = LightningEventCreate::new("sfdx")
        .run(&executor, dir.path(), &selection)
        .await
        .unwrap_err();
    assert!(matches!(err, ForceCliError::InvalidSelection(_)));
}

// ---------------------------------------------------------------------------
// force:source:deploy / force:source:push
// ---------------------------------------------------------------------------

#[test]
fn deploy_by_paths_command_shape() {
    let cmd = SourceDeploy::paths("sfdx", ["force-app/a.cls", "force-app/b.cls"])
        .build()
        .unwrap();
    assert_eq!(
        cmd.to_string(),
        "sfdx force:source:deploy --json --loglevel fatal --sourcepath force-app/a.cls,force-app/b.cls"
    );
}

#[test]
fn deploy_by_manifest_command_shape() {
    let cmd = SourceDeploy::manifest("sfdx", "manifest/package.xml")
        .build()
        .unwrap();
    assert_eq!(
        cmd.to_string(),
        "sfdx force:source:deploy --json --loglevel fatal --manifest manifest/package.xml"
    );
    assert_eq!(
        cmd.log_name.as_deref(),
        Some("force_source_deploy_with_manifest")
    );
}

#[test]
fn deploy_without_paths_is_rejected() {
    let err = SourceDeploy::paths("sfdx", Vec::<PathBuf>::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, ForceCliError::InvalidSelection(_)));
}

#[test]
fn push_force_overwrite_flag() {
    let plain = SourcePush::new("sfdx").build();
    assert!(!plain.args.contains(&"--forceoverwrite".to_string()));

    let forced = SourcePush::new("sfdx").force_overwrite(true).build();
    assert_eq!(
        forced.to_string(),
        "sfdx force:source:push --json --loglevel fatal --forceoverwrite"
    );
    assert_eq!(
        forced.log_name.as_deref(),
        Some("force_source_push_force_overwrite")
    );
}

#[tokio::test]
async fn push_conflict_is_classified() {
    let stdout = "\n{\"status\":1,\"name\":\"sourceConflictDetected\",\"result\":[{\"filePath\":\"a.cls\",\"type\":\"ApexClass\",\"state\":\"Conflict\"}]}\n";
    let executor = FakeExecutor::new(1, stdout, "");

    let parser = SourcePush::new("sfdx")
        .run(&executor, Path::new("/ws"))
        .await
        .unwrap();
    assert!(parser.has_conflicts());
    assert!(matches!(parser.outcome(), DeployOutcome::Conflict { .. }));
}

#[tokio::test]
async fn failed_deploy_still_parses_json() {
    let stdout = r#"{"status":1,"name":"DeployFailed","result":[{"filePath":"a.cls","type":"ApexClass","error":"bad"}]}"#;
    let executor = FakeExecutor::new(1, stdout, "");

    let parser = SourceDeploy::paths("sfdx", ["a.cls"])
        .run(&executor, Path::new("/ws"))
        .await
        .unwrap();
    assert_eq!(parser.errors().unwrap().result[0].error.as_deref(), Some("bad"));
}

#[tokio::test]
async fn nonzero_exit_without_json_is_process_exit() {
    let executor = FakeExecutor::new(127, "", "sfdx: command not found");

    let err = SourcePush::new("sfdx")
        .run(&executor, Path::new("/ws"))
        .await
        .unwrap_err();
    match err {
        ForceCliError::ProcessExit { code, stderr } => {
            assert_eq!(code, 127);
            assert!(stderr.contains("command not found"));
        }
        other => panic!("expected ProcessExit, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_exit_without_json_is_no_json() {
    let executor = FakeExecutor::new(0, "nothing to push\n", "");
    let err = SourcePush::new("sfdx")
        .run(&executor, Path::new("/ws"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForceCliError::NoJson));
}

#[test]
fn executor_errors_propagate() {
    let err = tokio_test::block_on(SourcePush::new("sfdx").run(&BrokenExecutor, Path::new("/ws")))
        .unwrap_err();
    assert!(matches!(err, ForceCliError::Io(_)));
    assert_eq!(err.user_message(), "I/O error while running command");
}
