use edcctl::commands::deploy::{install, uninstall, upgrade};
use edcctl::commands::{DeployContext, InstallArgs, TargetArgs, UninstallArgs, UpgradeArgs};
use edcctl::deploy::HistoryManager;
use edcctl::process::{CommandOutput, MockRunner};
use edcctl::ui::Output;
use std::path::Path;
use std::time::Duration;

use crate::common::init_test_logging;

fn context(runner: MockRunner, dir: &Path) -> DeployContext<MockRunner> {
    DeployContext {
        runner,
        output: Output::default(),
        history: HistoryManager::with_dir(dir.join("history")).unwrap(),
        backup_root: dir.join("backups"),
        config_path: None,
    }
}

fn target() -> TargetArgs {
    TargetArgs {
        namespace: Some("edc-test".into()),
        release: Some("provider".into()),
    }
}

fn fresh_cluster() -> MockRunner {
    MockRunner::builder()
        .respond("helm", &["status"], CommandOutput::failed(1, "Error: release: not found"))
        .build()
}

#[tokio::test]
async fn test_install_dry_run_invokes_no_mutating_commands() {
    init_test_logging();
    crate::test_log!("TEST START: test_install_dry_run_invokes_no_mutating_commands");

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(fresh_cluster(), dir.path());
    let args = InstallArgs {
        target: target(),
        values: vec![],
        with_infra: true,
        chart: None,
        version: Some("0.7.3".into()),
        config: None,
        dry_run: true,
        timeout: Duration::from_secs(600),
    };
    install(&ctx, args).await.unwrap();

    let calls = ctx.runner.invocations();
    assert!(!calls.is_empty(), "preflight should still run");
    assert!(ctx.runner.mutating_invocations().is_empty(), "{calls:?}");
    assert!(ctx.runner.ran("kubectl", &["cluster-info"]));
    crate::test_log!("TEST PASS: test_install_dry_run_invokes_no_mutating_commands");
}

#[tokio::test]
async fn test_upgrade_dry_run_writes_no_backup() {
    init_test_logging();
    crate::test_log!("TEST START: test_upgrade_dry_run_writes_no_backup");

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(MockRunner::builder().build(), dir.path());
    let args = UpgradeArgs {
        target: target(),
        values: vec![],
        chart: None,
        version: None,
        config: None,
        backup_dir: None,
        no_backup: false,
        dry_run: true,
        timeout: Duration::from_secs(600),
    };
    upgrade(&ctx, args).await.unwrap();

    assert!(ctx.runner.mutating_invocations().is_empty());
    assert!(!dir.path().join("backups").exists());
    crate::test_log!("TEST PASS: test_upgrade_dry_run_writes_no_backup");
}

#[tokio::test]
async fn test_uninstall_dry_run_with_infra() {
    init_test_logging();
    crate::test_log!("TEST START: test_uninstall_dry_run_with_infra");

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(MockRunner::builder().build(), dir.path());
    let args = UninstallArgs {
        target: target(),
        with_infra: true,
        delete_namespace: true,
        config: None,
        backup_dir: None,
        no_backup: true,
        force: false,
        dry_run: true,
    };
    uninstall(&ctx, args).await.unwrap();

    assert!(ctx.runner.mutating_invocations().is_empty());
    let history = ctx.history.get_history(5, Some("provider")).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].dry_run);
    crate::test_log!("TEST PASS: test_uninstall_dry_run_with_infra");
}

#[tokio::test]
async fn test_upgrade_keeps_values_and_backs_up() {
    init_test_logging();
    crate::test_log!("TEST START: test_upgrade_keeps_values_and_backs_up");

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(MockRunner::builder().build(), dir.path());
    let args = UpgradeArgs {
        target: target(),
        values: vec![],
        chart: None,
        version: None,
        config: None,
        backup_dir: Some(dir.path().join("custom-backups")),
        no_backup: false,
        dry_run: false,
        timeout: Duration::from_secs(300),
    };
    upgrade(&ctx, args).await.unwrap();

    assert!(ctx.runner.ran("helm", &["upgrade", "provider"]));
    let upgrade_call = ctx
        .runner
        .invocations()
        .into_iter()
        .find(|c| c.args.first().map(String::as_str) == Some("upgrade"))
        .unwrap();
    assert!(upgrade_call.args.iter().any(|a| a == "--reuse-values"));
    assert!(upgrade_call.args.iter().any(|a| a == "300s"));
    assert_eq!(
        std::fs::read_dir(dir.path().join("custom-backups")).unwrap().count(),
        1
    );
    let last = ctx.history.last_successful("provider").unwrap().unwrap();
    assert!(!last.dry_run);
    crate::test_log!("TEST PASS: test_upgrade_keeps_values_and_backs_up");
}
