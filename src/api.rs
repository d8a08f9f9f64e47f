//! Terraform Cloud v2 API client.
//!
//! Blocking HTTP/JSON over the `workspaces` and `runs` resources. The client
//! consumes the remote resource model; it does not own it.
use crate::config::Config;
use crate::payload::RunRequest;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use ureq::Agent;

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TfcClient {
    agent: Agent,
    base_url: String,
    org: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct WorkspaceList {
    data: Vec<WorkspaceResource>,
    #[serde(default)]
    meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceResource {
    id: String,
    attributes: WorkspaceAttributes,
}

#[derive(Debug, Deserialize)]
struct WorkspaceAttributes {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Pagination {
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RunDocument {
    data: RunResource,
}

#[derive(Debug, Deserialize)]
struct RunResource {
    id: String,
    attributes: RunResourceAttributes,
}

#[derive(Debug, Deserialize)]
struct RunResourceAttributes {
    status: String,
}

impl TfcClient {
    pub fn new(config: &Config) -> TfcClient {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        TfcClient {
            agent: Agent::new_with_config(agent_config),
            base_url: config.base_url.clone(),
            org: config.org.clone(),
            token: config.token.clone(),
        }
    }

    /// All workspaces in the organization, following pagination to the end.
    pub fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let mut workspaces = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/api/v2/organizations/{}/workspaces?page%5Bnumber%5D={page}&page%5Bsize%5D={PAGE_SIZE}",
                self.base_url, self.org
            );
            let listing: WorkspaceList = self
                .get_json(&url)
                .with_context(|| format!("list workspaces for organization {}", self.org))?;
            workspaces.extend(listing.data.into_iter().map(|resource| Workspace {
                id: resource.id,
                name: resource.attributes.name,
            }));
            match listing
                .meta
                .and_then(|meta| meta.pagination)
                .and_then(|pagination| pagination.next_page)
            {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(workspaces)
    }

    /// Create a run and return its ID. The run has real infrastructure effects.
    pub fn create_run(&self, request: &RunRequest) -> Result<String> {
        let url = format!("{}/api/v2/runs", self.base_url);
        tracing::debug!(url = %url, "creating run");
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/vnd.api+json")
            .send_json(request)
            .context("create run")?;
        let document: RunDocument = response
            .body_mut()
            .read_json()
            .context("decode run creation response")?;
        Ok(document.data.id)
    }

    /// The raw status string of an existing run.
    pub fn run_status(&self, run_id: &str) -> Result<String> {
        let url = format!("{}/api/v2/runs/{run_id}", self.base_url);
        let document: RunDocument = self
            .get_json(&url)
            .with_context(|| format!("show run {run_id}"))?;
        Ok(document.data.attributes.status)
    }

    /// Web UI URL where an operator can watch a run.
    pub fn run_url(&self, workspace_name: &str, run_id: &str) -> String {
        format!(
            "{}/app/{}/workspaces/{workspace_name}/runs/{run_id}",
            self.base_url, self.org
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url = %url, "GET");
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", self.bearer())
            .call()?;
        Ok(response.body_mut().read_json()?)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
