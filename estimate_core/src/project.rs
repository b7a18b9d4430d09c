//! # Project Data Structures
//!
//! The `EstimateProject` struct is the container an estimate is attached to.
//! It serializes to human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! EstimateProject
//! ├── meta: ProjectMetadata (version, id, name, estimator, client, timestamps)
//! ├── settings: EstimateSettings (markup, aggregation defaults, currency)
//! └── estimate: Option<AttachedEstimate> (latest summarized estimate)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::project::EstimateProject;
//!
//! let project = EstimateProject::new("Riverside Clinic", "Jane Estimator", "ACME Corp");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("Riverside Clinic"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{AggregationDefaults, MarkupPolicy, ProjectEstimate};

/// Current schema version for project and settings files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateProject {
    /// Project metadata
    pub meta: ProjectMetadata,

    /// Settings applied when estimating this project
    pub settings: EstimateSettings,

    /// Most recent estimate, if one has been attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<AttachedEstimate>,
}

impl EstimateProject {
    /// Create a new project with default settings and no estimate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use estimate_core::project::EstimateProject;
    ///
    /// let project = EstimateProject::new("Lot 7", "John Doe", "Client Corp");
    /// assert_eq!(project.meta.estimator, "John Doe");
    /// assert!(project.estimate.is_none());
    /// ```
    pub fn new(name: impl Into<String>, estimator: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        EstimateProject {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                estimator: estimator.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: EstimateSettings::default(),
            estimate: None,
        }
    }

    /// Attach an estimate, replacing any previous one.
    pub fn attach_estimate(&mut self, estimate: ProjectEstimate) {
        let now = Utc::now();
        self.estimate = Some(AttachedEstimate {
            estimated_at: now,
            estimate,
        });
        self.meta.modified = now;
    }
}

impl Default for EstimateProject {
    fn default() -> Self {
        EstimateProject::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Project identifier
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Name of the responsible estimator
    pub estimator: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// An estimate together with when it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedEstimate {
    pub estimated_at: DateTime<Utc>,
    pub estimate: ProjectEstimate,
}

/// Estimation settings.
///
/// Every field has a default, so a settings file only needs the keys it
/// changes:
///
/// ```json
/// { "markup": { "overhead_rate": 0.12, "profit_rate": 0.08 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    /// Schema version of a settings file
    pub version: String,

    /// Overhead and profit rates
    pub markup: MarkupPolicy,

    /// Measures substituted for elements without quantity annotations
    pub aggregation: AggregationDefaults,

    /// Symbol used in human-readable reports
    pub currency_symbol: String,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        EstimateSettings {
            version: SCHEMA_VERSION.to_string(),
            markup: MarkupPolicy::reference(),
            aggregation: AggregationDefaults::default(),
            currency_symbol: "$".to_string(),
        }
    }
}
