//! File-backed activity catalog.
//!
//! `.drip/activities.yaml` holds the activities of every course together with
//! their current availability rule. It stands in for the host system when the
//! engine is driven from the command line.

use super::{ActivityRepository, RuleField, RuleWrite};
use crate::error::{DripError, Result};
use crate::paths;
use crate::types::{Activity, ActivityId, ActivityTypeDescriptor, CourseId, GroupId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    activities: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct ActivityCatalog {
    path: PathBuf,
}

impl ActivityCatalog {
    /// Catalog of the project rooted at `root`.
    pub fn open(root: &Path) -> Self {
        Self::at(paths::catalog_path(root))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry, in file order. A missing file is an empty catalog.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let file: CatalogFile = serde_yaml::from_str(&data)?;
        Ok(file.activities)
    }

    fn save(&self, activities: Vec<CatalogEntry>) -> Result<()> {
        let data = serde_yaml::to_string(&CatalogFile { activities })?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    /// Add an activity, replacing any entry with the same id. The existing
    /// availability rule is kept on replace.
    pub fn upsert_activity(&self, activity: Activity) -> Result<()> {
        let mut entries = self.entries()?;
        match entries.iter_mut().find(|e| e.activity.id == activity.id) {
            Some(entry) => entry.activity = activity,
            None => entries.push(CatalogEntry {
                activity,
                availability: None,
            }),
        }
        self.save(entries)
    }
}

impl ActivityRepository for ActivityCatalog {
    fn list_activities(
        &self,
        course_id: CourseId,
        activity_type: &str,
        group: Option<GroupId>,
    ) -> Result<Vec<Activity>> {
        let mut found: Vec<Activity> = self
            .entries()?
            .into_iter()
            .map(|e| e.activity)
            .filter(|a| a.course_id == course_id && a.activity_type == activity_type)
            .filter(|a| a.in_group(group))
            .collect();
        found.sort_by_key(|a| (a.natural_order_index, a.id));
        Ok(found)
    }

    fn list_activity_types(
        &self,
        course_id: CourseId,
    ) -> Result<BTreeMap<String, ActivityTypeDescriptor>> {
        let mut types: BTreeMap<String, ActivityTypeDescriptor> = BTreeMap::new();
        for entry in self.entries()? {
            let a = entry.activity;
            if a.course_id != course_id {
                continue;
            }
            types
                .entry(a.activity_type.clone())
                .or_insert_with(|| ActivityTypeDescriptor {
                    name: a.activity_type,
                    count: 0,
                })
                .count += 1;
        }
        Ok(types)
    }
}

impl RuleField for ActivityCatalog {
    fn read(&self, activity_id: ActivityId) -> Result<Option<String>> {
        self.entries()?
            .into_iter()
            .find(|e| e.activity.id == activity_id)
            .map(|e| e.availability)
            .ok_or(DripError::ActivityNotFound(activity_id))
    }

    fn write(&self, activity_id: ActivityId, rule: Option<&str>) -> Result<()> {
        self.write_batch(&[RuleWrite {
            activity_id,
            rule: rule.map(str::to_string),
        }])
    }

    /// Applies every write to one copy of the catalog and replaces the file
    /// once, so either all rules change or none do.
    fn write_batch(&self, writes: &[RuleWrite]) -> Result<()> {
        let mut entries = self.entries()?;
        for w in writes {
            let entry = entries
                .iter_mut()
                .find(|e| e.activity.id == w.activity_id)
                .ok_or(DripError::ActivityNotFound(w.activity_id))?;
            entry.availability = w.rule.clone().filter(|r| !r.is_empty());
        }
        self.save(entries)
            .map_err(|e| DripError::ExternalWrite(format!("{}: {e}", self.path.display())))
    }
}
