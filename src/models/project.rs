use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Fields of the "create project" form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptionForm {
    pub project_descriptions_id: String,
    pub project_descriptions: String,
    pub project_name: String,
}

/// Fields of the "upload project files" form. `grade` stays textual until
/// submit, the way the form input holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUploadForm {
    pub project_id: String,
    pub project_description_id: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptionRecord {
    pub project_descriptions_id: String,
    pub project_descriptions: String,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUploadRecord {
    pub project_id: String,
    pub project_description_id: String,
    pub grade: u8,
    pub files: Vec<StoredFile>,
    pub created_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Reference to one uploaded object, as stored in the project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_name: String,
    pub storage_key: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}
