//! Run request construction.
//!
//! One constructor per workflow variant, each returning an immutable value in
//! the API's `runs` resource shape. Downstream automation keys on the run
//! messages, so they are fixed literals.
use serde::Serialize;

pub const DEFAULT_MESSAGE: &str = "Run from Python Lab Admin Script";
pub const DESTROY_MESSAGE: &str = "Destroy run from Python Lab Admin Script";

/// Lifecycle instruction consumed by the Intersight automation behind a
/// managed workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningMode {
    Unassign,
    Deploy,
    Delete,
}

impl ProvisioningMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProvisioningMode::Unassign => "Unassign",
            ProvisioningMode::Deploy => "Deploy",
            ProvisioningMode::Delete => "Delete",
        }
    }
}

/// Body for `POST /api/v2/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    data: RunData,
}

#[derive(Debug, Clone, Serialize)]
struct RunData {
    #[serde(rename = "type")]
    resource_type: &'static str,
    attributes: RunAttributes,
    relationships: Relationships,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
struct RunAttributes {
    message: &'static str,
    auto_apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_destroy: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variables: Vec<RunVariable>,
}

#[derive(Debug, Clone, Serialize)]
struct RunVariable {
    key: &'static str,
    value: String,
}

#[derive(Debug, Clone, Serialize)]
struct Relationships {
    workspace: WorkspaceRelation,
}

#[derive(Debug, Clone, Serialize)]
struct WorkspaceRelation {
    data: WorkspaceRef,
}

#[derive(Debug, Clone, Serialize)]
struct WorkspaceRef {
    #[serde(rename = "type")]
    resource_type: &'static str,
    id: String,
}

/// Apply with the workspace's own configuration, no variable overrides.
pub fn plain_apply(workspace_id: &str) -> RunRequest {
    build(workspace_id, DEFAULT_MESSAGE, None, Vec::new())
}

/// Destroy the workspace's resources directly.
pub fn plain_destroy(workspace_id: &str) -> RunRequest {
    build(workspace_id, DESTROY_MESSAGE, Some(true), Vec::new())
}

/// Apply that injects an `action_type` variable for the downstream
/// provisioner instead of flipping the destroy flag. The value is quoted
/// because run variables are HCL expressions.
pub fn provisioning_run(workspace_id: &str, mode: ProvisioningMode) -> RunRequest {
    let message = match mode {
        ProvisioningMode::Delete => DESTROY_MESSAGE,
        ProvisioningMode::Unassign | ProvisioningMode::Deploy => DEFAULT_MESSAGE,
    };
    let variables = vec![RunVariable {
        key: "action_type",
        value: format!("\"{}\"", mode.as_str()),
    }];
    build(workspace_id, message, None, variables)
}

fn build(
    workspace_id: &str,
    message: &'static str,
    is_destroy: Option<bool>,
    variables: Vec<RunVariable>,
) -> RunRequest {
    RunRequest {
        data: RunData {
            resource_type: "runs",
            attributes: RunAttributes {
                message,
                auto_apply: true,
                is_destroy,
                variables,
            },
            relationships: Relationships {
                workspace: WorkspaceRelation {
                    data: WorkspaceRef {
                        resource_type: "workspaces",
                        id: workspace_id.to_string(),
                    },
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn attributes(request: &RunRequest) -> Value {
        serde_json::to_value(request).expect("serialize run request")["data"]["attributes"].clone()
    }

    #[test]
    fn plain_apply_uses_workspace_defaults() {
        let request = plain_apply("ws-abc");
        let body = serde_json::to_value(&request).expect("serialize run request");
        assert_eq!(
            body,
            json!({
                "data": {
                    "type": "runs",
                    "attributes": {
                        "message": DEFAULT_MESSAGE,
                        "auto-apply": true
                    },
                    "relationships": {
                        "workspace": {
                            "data": { "type": "workspaces", "id": "ws-abc" }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn plain_destroy_sets_flag_and_message() {
        let body = attributes(&plain_destroy("ws-abc"));
        assert_eq!(body["is-destroy"], json!(true));
        assert_eq!(body["message"], json!(DESTROY_MESSAGE));
        assert!(body.get("variables").is_none());
    }

    #[test]
    fn provisioning_run_injects_quoted_variable() {
        let body = attributes(&provisioning_run("ws-abc", ProvisioningMode::Unassign));
        assert_eq!(
            body["variables"],
            json!([{ "key": "action_type", "value": "\"Unassign\"" }])
        );
        assert_eq!(body["message"], json!(DEFAULT_MESSAGE));
        assert!(body.get("is-destroy").is_none());
    }

    #[test]
    fn provisioning_delete_keeps_apply_shape_with_destroy_message() {
        let body = attributes(&provisioning_run("ws-abc", ProvisioningMode::Delete));
        assert_eq!(
            body["variables"],
            json!([{ "key": "action_type", "value": "\"Delete\"" }])
        );
        assert_eq!(body["message"], json!(DESTROY_MESSAGE));
        assert!(body.get("is-destroy").is_none());
    }
}
