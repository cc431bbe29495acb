//! Identity assignment for synthesized folder nodes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root UUIDv5 namespace for folder ids. Each tree namespace is hashed
/// under it first, then the folder path under that.
const FOLDER_ID_ROOT: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d0a_8e55_1b7c_9d20_f3a8);

/// How folder ids are produced.
///
/// Both variants render ids as `"{namespace}:{uuid}"`. Within a single
/// build a folder is created once and reused, so its id never changes for
/// the lifetime of that tree either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderIdPolicy {
    /// UUIDv5 over (namespace, folder path). Rebuilding the same input
    /// yields the same ids, so repeated upserts overwrite instead of piling up.
    #[default]
    Derived,
    /// Fresh UUIDv4 for every folder created.
    Random,
}

impl FolderIdPolicy {
    /// Returns the id for the folder at `folder_path` inside `namespace`.
    pub fn folder_id(self, namespace: &str, folder_path: &str) -> String {
        let uuid = match self {
            FolderIdPolicy::Derived => {
                let scope = Uuid::new_v5(&FOLDER_ID_ROOT, namespace.as_bytes());
                Uuid::new_v5(&scope, folder_path.as_bytes())
            }
            FolderIdPolicy::Random => Uuid::new_v4(),
        };
        format!("{namespace}:{uuid}")
    }
}
