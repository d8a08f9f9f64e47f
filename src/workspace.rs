//! Workspace model and classification.
//!
//! Workspaces whose names follow the `-IKS` naming convention are backed by
//! Intersight Kubernetes Service, and their lifecycle is driven through run
//! variables instead of plain apply/destroy. Classification happens once per
//! workspace and is carried as typed data so no branch re-derives it.
use regex::Regex;

/// Match something-IKS-something or something-IKS, but not something-IKSsomething.
const MANAGED_NAME_PATTERN: &str = r"(?i)^(.*-iks-.*|.*-iks)$";

/// One workspace from the organization listing, immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

impl Workspace {
    pub fn class(&self) -> WorkspaceClass {
        WorkspaceClass::of(&self.name)
    }
}

/// How a workspace's apply/destroy lifecycle is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceClass {
    /// Plain Terraform apply/destroy semantics.
    Standard,
    /// Intersight IKS: runs inject an `action_type` variable consumed by the
    /// downstream provisioner.
    ManagedProvisioning,
}

impl WorkspaceClass {
    pub fn of(name: &str) -> WorkspaceClass {
        let pattern = Regex::new(MANAGED_NAME_PATTERN).expect("managed name pattern compiles");
        if pattern.is_match(name) {
            WorkspaceClass::ManagedProvisioning
        } else {
            WorkspaceClass::Standard
        }
    }
}

pub fn find_by_id<'a>(workspaces: &'a [Workspace], id: &str) -> Option<&'a Workspace> {
    workspaces.iter().find(|workspace| workspace.id == id)
}
