//! Crew and photo records referenced by tasks.
//!
//! These belong to the labor and photo-log side of the application. Tasks
//! only hold their ids, and a missing id is shown as absent, never an error.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub trade: String,
}

impl Worker {
    pub fn new(name: impl Into<String>, trade: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            trade: trade.into(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.trade.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.trade)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: Uuid,
    #[serde(default)]
    pub caption: String,
    pub path: PathBuf,
    pub taken_on: NaiveDate,
}

impl Photo {
    pub fn new(path: PathBuf, taken_on: NaiveDate) -> Self {
        let caption = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("photo")
            .to_string();
        Self {
            id: Uuid::new_v4(),
            caption,
            path,
            taken_on,
        }
    }
}
