//! Workflow selection and run launching.
//!
//! The action and the workspace classification pick one of four workflows:
//! plain apply, plain destroy, or the Intersight-managed variants that drive
//! the provisioner through injected variables. Managed applies are two
//! sequential runs with a settle delay in between.
use crate::api::TfcClient;
use crate::cli::Action;
use crate::payload::{self, ProvisioningMode, RunRequest};
use crate::poll::{self, is_success_status, PollOptions, PollOutcome};
use crate::workspace::{Workspace, WorkspaceClass};
use anyhow::{anyhow, Context, Result};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Creates runs and watches them to completion. `RunLauncher` is the live
/// implementation; tests script one to inspect the submitted requests.
pub trait RunDriver {
    fn create_run(&self, request: &RunRequest) -> Result<String>;
    fn watch_run(&self, run_id: &str, workspace: &Workspace) -> PollOutcome;
}

/// Launches runs against the live API.
pub struct RunLauncher<'a> {
    client: &'a TfcClient,
    poll: PollOptions,
}

impl<'a> RunLauncher<'a> {
    pub fn new(client: &'a TfcClient) -> RunLauncher<'a> {
        RunLauncher {
            client,
            poll: PollOptions::default(),
        }
    }
}

impl RunDriver for RunLauncher<'_> {
    fn create_run(&self, request: &RunRequest) -> Result<String> {
        self.client.create_run(request)
    }

    fn watch_run(&self, run_id: &str, workspace: &Workspace) -> PollOutcome {
        println!("\nRun on {} is starting!", workspace.name);
        println!(
            "You can monitor this run at: {}",
            self.client.run_url(&workspace.name, run_id)
        );
        poll::poll_run(self.client, run_id, &self.poll)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    /// Pause between the two phases of a managed apply, giving the external
    /// provisioner time to settle.
    pub settle_delay: Duration,
}

impl Default for WorkflowOptions {
    fn default() -> WorkflowOptions {
        WorkflowOptions {
            settle_delay: Duration::from_secs(10),
        }
    }
}

/// Run the workflow selected by `action` and the workspace classification.
pub fn execute(
    driver: &impl RunDriver,
    action: Action,
    workspace: &Workspace,
    options: &WorkflowOptions,
) -> Result<()> {
    match (action, workspace.class()) {
        (Action::Apply, WorkspaceClass::ManagedProvisioning) => {
            managed_apply(driver, workspace, options)
        }
        (Action::Destroy, WorkspaceClass::ManagedProvisioning) => {
            managed_destroy(driver, workspace)
        }
        (Action::Apply, WorkspaceClass::Standard) => {
            launch(driver, workspace, &payload::plain_apply(&workspace.id))
        }
        (Action::Destroy, WorkspaceClass::Standard) => {
            launch(driver, workspace, &payload::plain_destroy(&workspace.id))
        }
    }
}

/// Two-phase managed apply: unassign, let the provisioner settle, deploy.
fn managed_apply(
    driver: &impl RunDriver,
    workspace: &Workspace,
    options: &WorkflowOptions,
) -> Result<()> {
    println!("\n!!! This is an IKS run. Starting run with action_type = Unassign");
    launch(
        driver,
        workspace,
        &payload::provisioning_run(&workspace.id, ProvisioningMode::Unassign),
    )?;
    println!(
        "Sleeping for {} seconds to allow Intersight to finish",
        options.settle_delay.as_secs()
    );
    settle(options.settle_delay);
    println!("\n\n!!! Starting a new run with action_type = Deploy");
    launch(
        driver,
        workspace,
        &payload::provisioning_run(&workspace.id, ProvisioningMode::Deploy),
    )?;
    println!("!!! Even though Terraform has completed, Intersight will need to finish deploying the IKS cluster.");
    println!("!!! It typically takes Intersight IKS 20-40 minutes to deploy the cluster completely");
    println!("!!! You can check the Intersight status at https://www.intersight.com\n");
    Ok(())
}

fn managed_destroy(driver: &impl RunDriver, workspace: &Workspace) -> Result<()> {
    println!("\n!!! This is an IKS run. Starting run with action_type = Delete");
    launch(
        driver,
        workspace,
        &payload::provisioning_run(&workspace.id, ProvisioningMode::Delete),
    )?;
    println!("!!! Even though Terraform has completed, Intersight will need to finish destroying the IKS cluster.");
    println!("!!! It typically takes Intersight IKS 10-20 minutes to destroy the cluster completely.");
    println!("!!! You can check the Intersight status at https://www.intersight.com\n");
    Ok(())
}

/// Create one run and watch it to completion; anything but a successful
/// terminal status aborts the workflow.
fn launch(driver: &impl RunDriver, workspace: &Workspace, request: &RunRequest) -> Result<()> {
    let run_id = driver
        .create_run(request)
        .with_context(|| format!("create run on workspace {}", workspace.name))?;
    match driver.watch_run(&run_id, workspace) {
        PollOutcome::Finished { status } if is_success_status(&status) => Ok(()),
        PollOutcome::Finished { status } => {
            Err(anyhow!("run {run_id} finished in state {status}"))
        }
        PollOutcome::TimedOut { last_status } => Err(anyhow!(
            "gave up waiting for run {run_id} to finish (last status: {})",
            last_status.as_deref().unwrap_or("never observed")
        )),
        PollOutcome::Unknown { .. } => Err(anyhow!(
            "lost contact with the API while watching run {run_id}; it may still be in progress"
        )),
    }
}

fn settle(delay: Duration) {
    for _ in 0..delay.as_secs() {
        print!(".");
        let _ = io::stdout().flush();
        thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct ScriptedDriver {
        requests: RefCell<Vec<Value>>,
        outcomes: RefCell<VecDeque<PollOutcome>>,
    }

    impl ScriptedDriver {
        fn applying_cleanly() -> ScriptedDriver {
            ScriptedDriver::with_outcomes(Vec::new())
        }

        fn with_outcomes(outcomes: Vec<PollOutcome>) -> ScriptedDriver {
            ScriptedDriver {
                requests: RefCell::new(Vec::new()),
                outcomes: RefCell::new(outcomes.into()),
            }
        }

        fn request_attributes(&self) -> Vec<Value> {
            self.requests
                .borrow()
                .iter()
                .map(|request| request["data"]["attributes"].clone())
                .collect()
        }
    }

    impl RunDriver for ScriptedDriver {
        fn create_run(&self, request: &RunRequest) -> Result<String> {
            let mut requests = self.requests.borrow_mut();
            requests.push(serde_json::to_value(request).expect("serialize request"));
            Ok(format!("run-{}", requests.len()))
        }

        fn watch_run(&self, _run_id: &str, _workspace: &Workspace) -> PollOutcome {
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| PollOutcome::Finished {
                    status: "applied".to_string(),
                })
        }
    }

    fn workspace(name: &str) -> Workspace {
        Workspace {
            id: "ws-abc123".to_string(),
            name: name.to_string(),
        }
    }

    fn immediate() -> WorkflowOptions {
        WorkflowOptions {
            settle_delay: Duration::ZERO,
        }
    }

    #[test]
    fn managed_apply_launches_unassign_then_deploy() {
        let driver = ScriptedDriver::applying_cleanly();
        execute(
            &driver,
            Action::Apply,
            &workspace("cluster-IKS-01"),
            &immediate(),
        )
        .expect("managed apply");
        let attributes = driver.request_attributes();
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes[0]["variables"],
            json!([{ "key": "action_type", "value": "\"Unassign\"" }])
        );
        assert_eq!(
            attributes[1]["variables"],
            json!([{ "key": "action_type", "value": "\"Deploy\"" }])
        );
    }

    #[test]
    fn managed_apply_stops_after_a_failed_first_phase() {
        let driver = ScriptedDriver::with_outcomes(vec![PollOutcome::Finished {
            status: "errored".to_string(),
        }]);
        let err = execute(
            &driver,
            Action::Apply,
            &workspace("cluster-IKS-01"),
            &immediate(),
        )
        .expect_err("first phase failed");
        assert_eq!(driver.request_attributes().len(), 1);
        assert!(err.to_string().contains("errored"));
    }

    #[test]
    fn managed_destroy_launches_a_single_delete_run() {
        let driver = ScriptedDriver::applying_cleanly();
        execute(
            &driver,
            Action::Destroy,
            &workspace("cluster-IKS"),
            &immediate(),
        )
        .expect("managed destroy");
        let attributes = driver.request_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(
            attributes[0]["variables"],
            json!([{ "key": "action_type", "value": "\"Delete\"" }])
        );
        assert_eq!(attributes[0]["message"], json!(payload::DESTROY_MESSAGE));
        assert!(attributes[0].get("is-destroy").is_none());
    }

    #[test]
    fn standard_apply_launches_one_plain_run() {
        let driver = ScriptedDriver::applying_cleanly();
        execute(&driver, Action::Apply, &workspace("web-prod"), &immediate())
            .expect("standard apply");
        let attributes = driver.request_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0]["auto-apply"], json!(true));
        assert_eq!(attributes[0]["message"], json!(payload::DEFAULT_MESSAGE));
        assert!(attributes[0].get("variables").is_none());
        assert!(attributes[0].get("is-destroy").is_none());
    }

    #[test]
    fn standard_destroy_sets_the_destroy_flag() {
        let driver = ScriptedDriver::applying_cleanly();
        execute(
            &driver,
            Action::Destroy,
            &workspace("web-prod"),
            &immediate(),
        )
        .expect("standard destroy");
        let attributes = driver.request_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0]["is-destroy"], json!(true));
        assert_eq!(attributes[0]["message"], json!(payload::DESTROY_MESSAGE));
    }

    #[test]
    fn a_merged_iks_token_gets_the_standard_workflow() {
        let driver = ScriptedDriver::applying_cleanly();
        execute(
            &driver,
            Action::Apply,
            &workspace("cluster-IKSpecial"),
            &immediate(),
        )
        .expect("standard apply");
        let attributes = driver.request_attributes();
        assert_eq!(attributes.len(), 1);
        assert!(attributes[0].get("variables").is_none());
    }

    #[test]
    fn an_unknown_outcome_fails_the_workflow() {
        let driver = ScriptedDriver::with_outcomes(vec![PollOutcome::Unknown {
            last_status: Some("applying".to_string()),
        }]);
        let err = execute(&driver, Action::Apply, &workspace("web-prod"), &immediate())
            .expect_err("unknown outcome");
        assert!(err.to_string().contains("may still be in progress"));
    }

    #[test]
    fn a_timed_out_watch_fails_the_workflow() {
        let driver = ScriptedDriver::with_outcomes(vec![PollOutcome::TimedOut {
            last_status: Some("planning".to_string()),
        }]);
        let err = execute(&driver, Action::Apply, &workspace("web-prod"), &immediate())
            .expect_err("timed out");
        assert!(err.to_string().contains("gave up waiting"));
    }
}
