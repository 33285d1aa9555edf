//! Wire types for the Grafana HTTP API.

use serde::{Deserialize, Serialize};

use crate::config::FolderSelector;
use crate::utils::errors::{BackupError, Result};

/// One entry from `GET /api/folders/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub title: String,
}

/// One search hit from `GET /api/search?folderIds={id}&type=dash-db`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub uid: String,
    pub title: String,
}

/// Match a configured folder selector against the folder listing.
///
/// An id selector must name an existing folder; a title selector must match
/// exactly one folder. Anything else is a hard error rather than a silent
/// wrong pick.
pub fn find_folder(folders: &[Folder], selector: &FolderSelector) -> Result<Folder> {
    match selector {
        FolderSelector::Id(id) => folders
            .iter()
            .find(|f| f.id == *id)
            .cloned()
            .ok_or_else(|| BackupError::FolderNotFound(selector.to_string())),
        FolderSelector::Title(title) => {
            let matches: Vec<&Folder> = folders.iter().filter(|f| f.title == *title).collect();
            match matches.as_slice() {
                [] => Err(BackupError::FolderNotFound(selector.to_string())),
                [folder] => Ok((*folder).clone()),
                _ => Err(BackupError::AmbiguousFolder {
                    selector: selector.to_string(),
                    count: matches.len(),
                }),
            }
        }
    }
}
