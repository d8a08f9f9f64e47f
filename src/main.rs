//! Terraform Cloud run driver for lab workspaces.
use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use std::io;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod config;
mod interactive;
mod payload;
mod poll;
mod workflow;
mod workspace;

use cli::{Mode, RootArgs};
use workspace::Workspace;

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();
    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(err) => usage_exit(&err),
    };

    let config = config::Config::from_env();
    let client = api::TfcClient::new(&config);
    let workspaces = client.list_workspaces().context("list workspaces")?;

    match mode {
        Mode::ListOnly => {
            print_workspaces(&workspaces);
            Ok(())
        }
        Mode::Automation {
            action,
            workspace_id,
        } => {
            let workspace = workspace::find_by_id(&workspaces, &workspace_id).ok_or_else(|| {
                anyhow!(
                    "no workspace with ID {workspace_id} in organization {}",
                    config.org
                )
            })?;
            run(&client, action, workspace)
        }
        Mode::Interactive => {
            print_workspaces(&workspaces);
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let workspace = interactive::prompt_workspace(&workspaces, &mut input)?;
            match interactive::prompt_action(&mut input)? {
                interactive::Choice::Exit => Ok(()),
                interactive::Choice::Run(action) => run(&client, action, workspace),
            }
        }
    }
}

fn run(client: &api::TfcClient, action: cli::Action, workspace: &Workspace) -> Result<()> {
    let launcher = workflow::RunLauncher::new(client);
    workflow::execute(
        &launcher,
        action,
        workspace,
        &workflow::WorkflowOptions::default(),
    )
}

fn print_workspaces(workspaces: &[Workspace]) {
    for workspace in workspaces {
        println!("Workspace ID: {}   Name: {}", workspace.id, workspace.name);
    }
}

fn usage_exit(err: &anyhow::Error) -> ! {
    eprintln!("{err}");
    eprintln!();
    let _ = RootArgs::command().print_help();
    std::process::exit(2);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
