use crate::data::WeeklyGrid;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

pub type VersionId = u32;

/// Lifecycle of the saved timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum TimetableStatus {
    #[default]
    #[serde(rename = "Not Generated")]
    NotGenerated,
    Generated,
    Published,
}

/// One generated timetable kept for review and publishing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableVersion {
    pub id: VersionId,
    pub name: String,
    pub department: String,
    pub grid: WeeklyGrid,
    pub is_published: bool,
}

/// The timetable currently saved, and its status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedTimetable {
    pub status: TimetableStatus,
    pub grid: Option<WeeklyGrid>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("timetable version {0} not found")]
    VersionNotFound(VersionId),
}

#[derive(Debug, Default)]
struct StoreState {
    versions: Vec<TimetableVersion>,
    saved: Option<WeeklyGrid>,
    status: TimetableStatus,
}

/// In-memory home for generated timetables. Shared by reference, never global.
#[derive(Debug, Default)]
pub struct TimetableStore {
    state: RwLock<StoreState>,
}

impl TimetableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps a freshly generated grid as a new version and saves it as current.
    pub async fn record_generated(
        &self,
        department: Option<&str>,
        grid: WeeklyGrid,
    ) -> TimetableVersion {
        let mut state = self.state.write().await;

        let department = department.map(str::trim).unwrap_or("").to_string();
        let id = state.versions.len() as VersionId + 1;
        let name = if department.is_empty() {
            format!("Version {id} – All Departments")
        } else {
            format!("Version {id} – {department}")
        };

        let version = TimetableVersion {
            id,
            name,
            department,
            grid: grid.clone(),
            is_published: false,
        };
        state.versions.push(version.clone());
        state.saved = Some(grid);
        state.status = TimetableStatus::Generated;

        info!("Saved {}", version.name);
        version
    }

    /// Publishes one version; every other version becomes unpublished.
    pub async fn publish(&self, id: VersionId) -> Result<TimetableVersion, StoreError> {
        let mut state = self.state.write().await;

        let Some(index) = state.versions.iter().position(|v| v.id == id) else {
            return Err(StoreError::VersionNotFound(id));
        };

        for version in &mut state.versions {
            version.is_published = version.id == id;
        }
        let published = state.versions[index].clone();

        state.saved = Some(published.grid.clone());
        state.status = TimetableStatus::Published;

        info!("Published {}", published.name);
        Ok(published)
    }

    /// Versions newest first, optionally narrowed by a case-insensitive name search.
    pub async fn versions(&self, search: Option<&str>) -> Vec<TimetableVersion> {
        let state = self.state.read().await;
        let needle = search.unwrap_or("").to_lowercase();

        state
            .versions
            .iter()
            .rev()
            .filter(|v| v.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn current(&self) -> SavedTimetable {
        let state = self.state.read().await;
        SavedTimetable {
            status: state.status,
            grid: state.saved.clone(),
        }
    }
}
