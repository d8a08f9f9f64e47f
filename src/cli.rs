//! CLI argument parsing.
//!
//! The CLI is intentionally thin: flags select one of three invocation modes
//! and all remote work happens behind the mode dispatch in `main`.
use anyhow::{anyhow, Result};
use clap::Parser;

/// Root CLI entrypoint for the lab run driver.
#[derive(Parser, Debug)]
#[command(
    name = "lab-admin",
    version,
    about = "Drive Terraform Cloud apply/destroy runs for lab workspaces",
    after_help = "Environment:\n  TFC_TOKEN  API token (required for any remote call)\n  TFC_ORG    Organization name (required for any remote call)\n  TFC_URL    API base URL (default: https://app.terraform.io)\n\nExamples:\n  lab-admin                       Interactive mode: pick a workspace and action\n  lab-admin -l                    List all workspaces and exit\n  lab-admin -a apply ws-iWrmrc5TZkTCBLhP\n  lab-admin -a destroy ws-iWrmrc5TZkTCBLhP"
)]
pub struct RootArgs {
    /// List all workspaces (ID and name) and exit without running anything
    #[arg(short = 'l', long = "list", conflicts_with = "auto")]
    pub list: bool,

    /// Non-interactive run: ACTION is apply or destroy, WORKSPACE_ID starts with ws-
    #[arg(
        short = 'a',
        long = "auto",
        num_args = 2,
        value_names = ["ACTION", "WORKSPACE_ID"]
    )]
    pub auto: Option<Vec<String>>,
}

/// Requested run action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    Destroy,
}

impl Action {
    /// Case-insensitive parse of the two accepted literals.
    pub fn parse(raw: &str) -> Option<Action> {
        if raw.eq_ignore_ascii_case("apply") {
            Some(Action::Apply)
        } else if raw.eq_ignore_ascii_case("destroy") {
            Some(Action::Destroy)
        } else {
            None
        }
    }
}

/// Resolved invocation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    ListOnly,
    Automation { action: Action, workspace_id: String },
}

impl RootArgs {
    /// Resolve the invocation mode, validating automation inputs.
    pub fn mode(&self) -> Result<Mode> {
        if self.list {
            return Ok(Mode::ListOnly);
        }
        let Some(auto) = &self.auto else {
            return Ok(Mode::Interactive);
        };
        let [raw_action, workspace_id] = auto.as_slice() else {
            return Err(anyhow!(
                "-a takes exactly two values: <apply|destroy> <workspace-id>"
            ));
        };
        let action = Action::parse(raw_action)
            .ok_or_else(|| anyhow!("invalid action {raw_action:?}: expected apply or destroy"))?;
        if !workspace_id.starts_with("ws-") {
            return Err(anyhow!(
                "invalid workspace ID {workspace_id:?}: expected a ws- prefix"
            ));
        }
        Ok(Mode::Automation {
            action,
            workspace_id: workspace_id.clone(),
        })
    }
}
