//! End-to-end runs of the pipeline against a scratch compose file and a recording runner.

use std::path::PathBuf;

use certsync::compose::ComposeDocument;
use certsync::config::Settings;
use certsync::node::{NodeTarget, SshAuth};
use certsync::pipeline::Pipeline;
use certsync::runner::{CommandOutput, RecordingRunner};
use certsync::CertSyncError;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use tempfile::TempDir;

const COMPOSE: &str = "\
services:
  remnawave:
    image: remnawave/backend:latest
    volumes:
    - ./data:/var/lib/remnawave/data
  remnawave-db:
    image: postgres:17
";

fn setup(contents: &str) -> (TempDir, Settings) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("docker-compose.yml"), contents).unwrap();
    let settings = Settings {
        compose_dir: dir.path().to_path_buf(),
        panel_cert_base: PathBuf::from("/opt/remnawave/ssl_certs"),
        use_sudo: false,
        ..Settings::default()
    };
    (dir, settings)
}

fn node(auth: SshAuth) -> NodeTarget {
    NodeTarget::new("203.0.113.7", "node1.example.com", "root", auth).unwrap()
}

fn compose_text(settings: &Settings) -> String {
    std::fs::read_to_string(settings.compose_path()).unwrap()
}

#[tokio::test]
async fn full_run_copies_mounts_and_restarts() {
    let (dir, settings) = setup(COMPOSE);
    let runner = RecordingRunner::new();

    let summary = Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::KeyFile(PathBuf::from("/root/.ssh/id_ed25519"))))
        .await
        .unwrap();

    assert!(summary.mount_added);
    assert_eq!(
        summary.panel_cert_dir,
        PathBuf::from("/opt/remnawave/ssl_certs/node1.example.com")
    );
    assert_eq!(
        summary.container_cert_dir,
        "/var/lib/remnawave/configs/xray/ssl/node1.example.com"
    );
    assert_eq!(
        summary.key_file(),
        "/var/lib/remnawave/configs/xray/ssl/node1.example.com/privkey.pem"
    );

    assert_eq!(
        runner.commands(),
        vec![
            "mkdir -p /opt/remnawave/ssl_certs/node1.example.com".to_string(),
            "scp -r -i /root/.ssh/id_ed25519 root@203.0.113.7:/etc/letsencrypt/live/node1.example.com/. /opt/remnawave/ssl_certs/node1.example.com".to_string(),
            "docker compose down".to_string(),
            "docker compose up -d".to_string(),
        ]
    );
    let calls = runner.calls();
    assert_eq!(calls[2].cwd.as_deref(), Some(dir.path()));
    assert_eq!(calls[3].cwd.as_deref(), Some(dir.path()));

    let document = ComposeDocument::load(&settings.compose_path()).unwrap();
    assert_eq!(
        document.volumes("remnawave"),
        vec![
            "./data:/var/lib/remnawave/data",
            "/opt/remnawave/ssl_certs/node1.example.com:/var/lib/remnawave/configs/xray/ssl/node1.example.com",
        ]
    );
    assert_eq!(
        document.root()["services"]["remnawave-db"]["image"],
        serde_yaml::Value::from("postgres:17")
    );
}

#[tokio::test]
async fn second_run_is_a_no_op_on_the_compose_file() {
    let (_dir, settings) = setup(COMPOSE);
    let runner = RecordingRunner::new();
    let pipeline = Pipeline::new(&settings, &runner);

    pipeline.run(&node(SshAuth::Agent)).await.unwrap();
    let first = compose_text(&settings);

    let summary = pipeline.run(&node(SshAuth::Agent)).await.unwrap();
    assert!(!summary.mount_added);
    assert_eq!(compose_text(&settings), first);
}

#[tokio::test]
async fn password_auth_goes_through_sshpass_env() {
    let (_dir, settings) = setup(COMPOSE);
    let runner = RecordingRunner::new().respond_to(
        "which sshpass",
        CommandOutput {
            stdout: "/usr/bin/sshpass\n".to_string(),
            ..CommandOutput::ok()
        },
    );

    Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Password(SecretString::from("s3cret".to_string()))))
        .await
        .unwrap();

    let scp = runner
        .calls()
        .into_iter()
        .find(|call| call.command.starts_with("sshpass"))
        .unwrap();
    assert_eq!(
        scp.command,
        "sshpass -e scp -r root@203.0.113.7:/etc/letsencrypt/live/node1.example.com/. /opt/remnawave/ssl_certs/node1.example.com"
    );
    assert_eq!(scp.env, vec![("SSHPASS".to_string(), "s3cret".to_string())]);
}

#[tokio::test]
async fn missing_sshpass_stops_before_anything_runs() {
    let (_dir, settings) = setup(COMPOSE);
    let runner = RecordingRunner::new().fail_on("which sshpass", 1, "");

    let err = Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Password(SecretString::from("pw".to_string()))))
        .await
        .unwrap_err();

    assert!(matches!(err, CertSyncError::DependencyMissing { .. }));
    assert_eq!(runner.commands(), vec!["which sshpass".to_string()]);
    assert_eq!(compose_text(&settings), COMPOSE);
}

#[tokio::test]
async fn failed_copy_leaves_compose_untouched() {
    let (_dir, settings) = setup(COMPOSE);
    let runner = RecordingRunner::new().fail_on("scp", 1, "No such file or directory");

    let err = Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Agent))
        .await
        .unwrap_err();

    assert!(matches!(err, CertSyncError::ProcessFailure { .. }));
    assert_eq!(compose_text(&settings), COMPOSE);
    assert!(!runner.commands().iter().any(|c| c.contains("compose")));
}

#[tokio::test]
async fn wrong_compose_file_is_schema_error_and_no_restart() {
    let original = "services:\n  nginx:\n    image: nginx\n";
    let (_dir, settings) = setup(original);
    let runner = RecordingRunner::new();

    let err = Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Agent))
        .await
        .unwrap_err();

    assert!(matches!(err, CertSyncError::Schema { .. }));
    assert_eq!(compose_text(&settings), original);
    assert_eq!(runner.commands().len(), 2);
}

#[tokio::test]
async fn sudo_prefixes_privileged_steps() {
    let (_dir, mut settings) = setup(COMPOSE);
    settings.use_sudo = true;
    let runner = RecordingRunner::new();

    Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Agent))
        .await
        .unwrap();

    let commands = runner.commands();
    assert!(commands[0].starts_with("sudo mkdir -p"));
    assert!(commands[1].starts_with("scp -r"));
    assert_eq!(commands[2], "sudo docker compose down");
    assert_eq!(commands[3], "sudo docker compose up -d");
}

#[tokio::test]
async fn remote_dir_template_is_configurable() {
    let (_dir, mut settings) = setup(COMPOSE);
    settings.remote_cert_dir = "/root/certs/{{ domain }}".to_string();
    let runner = RecordingRunner::new();

    Pipeline::new(&settings, &runner)
        .run(&node(SshAuth::Agent))
        .await
        .unwrap();

    assert!(runner.commands()[1].contains("root@203.0.113.7:/root/certs/node1.example.com/."));
}
