//! Tenant addressing
//!
//! A tenant (project) plus a version names one independent slot
//! configuration namespace. Multiple configurations coexist in one process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to one (project, version) configuration namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantRef {
    /// Project name
    pub project: String,
    /// Project version
    pub version: String,
}

impl TenantRef {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for TenantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.version)
    }
}
