// Image inventory model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    /// Repository of the first tag reported for this id ("<none>" for dangling images).
    pub name: String,
    pub tag: String,
    /// Every `repository:tag` the runtime reported for this id.
    pub repo_tags: Vec<String>,
    /// Human-readable size as the runtime prints it (e.g. "142MB").
    pub size: String,
    pub size_bytes: u64,
    pub created: String,
}
