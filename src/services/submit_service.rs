use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use uuid::Uuid;

use crate::errors::{Result, ReviewerError, StoreError};
use crate::models::{
    ProjectDescriptionForm, ProjectDescriptionRecord, ProjectUploadForm, ProjectUploadRecord,
    SelectedFile, StoredFile,
};
use crate::services::config_service::Config;
use crate::services::store_service::{ObjectStore, RecordStore};

const SUFFIX_LEN: usize = 7;

/// Validates form fields and persists them, uploading attached files first.
pub struct RecordSubmitter {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    descriptions_table: String,
    projects_table: String,
    bucket: String,
}

impl RecordSubmitter {
    pub fn new(records: Arc<dyn RecordStore>, objects: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            records,
            objects,
            descriptions_table: config.descriptions_table.clone(),
            projects_table: config.projects_table.clone(),
            bucket: config.bucket.clone(),
        }
    }

    pub async fn submit_project_description(
        &self,
        form: &ProjectDescriptionForm,
    ) -> Result<ProjectDescriptionRecord> {
        require_fields(&[
            ("project_descriptions_id", &form.project_descriptions_id),
            ("project_descriptions", &form.project_descriptions),
            ("project_name", &form.project_name),
        ])?;

        let now = Utc::now();
        let record = ProjectDescriptionRecord {
            project_descriptions_id: form.project_descriptions_id.clone(),
            project_descriptions: form.project_descriptions.clone(),
            project_name: form.project_name.clone(),
            created_at: now,
            timestamp: now,
        };

        let item = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.records
            .put_record(&self.descriptions_table, &record.project_descriptions_id, item)
            .await
            .map_err(|e| {
                log::error!("Error saving project description: {}", e);
                ReviewerError::from(e)
            })?;

        log::info!("Saved project description {}", record.project_descriptions_id);
        Ok(record)
    }

    /// Uploads every file concurrently, then writes the project record.
    /// Objects uploaded before a failing upload are left in place.
    pub async fn submit_project_upload(
        &self,
        form: &ProjectUploadForm,
        files: &[SelectedFile],
    ) -> Result<ProjectUploadRecord> {
        require_fields(&[
            ("project_id", &form.project_id),
            ("project_description_id", &form.project_description_id),
            ("grade", &form.grade),
        ])?;
        let grade = parse_grade(&form.grade)?;

        if files.is_empty() {
            return Err(ReviewerError::NoFilesSelected);
        }

        let uploads = files
            .iter()
            .map(|file| self.upload_file(&form.project_id, file));
        let stored = try_join_all(uploads).await?;

        let now = Utc::now();
        let record = ProjectUploadRecord {
            project_id: form.project_id.clone(),
            project_description_id: form.project_description_id.clone(),
            grade,
            files: stored,
            created_at: now,
            timestamp: now,
        };

        let item = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.records
            .put_record(&self.projects_table, &record.project_id, item)
            .await
            .map_err(|e| {
                log::error!("Error saving project upload: {}", e);
                ReviewerError::from(e)
            })?;

        log::info!(
            "Saved project {} with {} files",
            record.project_id,
            record.files.len()
        );
        Ok(record)
    }

    async fn upload_file(&self, project_id: &str, file: &SelectedFile) -> Result<StoredFile> {
        let key = object_key(project_id, file, Utc::now());
        let body = file.handle.read().await?;

        self.objects
            .put_object(&self.bucket, &key, body, &file.mime_type)
            .await
            .map_err(|e| {
                log::error!("Error uploading {} as {}: {}", file.name, key, e);
                ReviewerError::from(e)
            })?;

        Ok(StoredFile {
            file_name: file.name.clone(),
            storage_key: key,
            size: file.size,
            content_type: file.mime_type.clone(),
        })
    }
}

/// `{projectId}/{timestampMillis}-{randomSuffix}.{extension}`
pub fn object_key(project_id: &str, file: &SelectedFile, now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(SUFFIX_LEN).collect();
    format!(
        "{}/{}-{}.{}",
        project_id,
        now.timestamp_millis(),
        suffix,
        file.extension()
    )
}

fn require_fields(fields: &[(&str, &String)]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReviewerError::MissingFields(missing))
    }
}

fn parse_grade(raw: &str) -> Result<u8> {
    match raw.trim().parse::<u8>() {
        Ok(grade) if grade <= 100 => Ok(grade),
        _ => Err(ReviewerError::Validation(format!(
            "Grade must be a whole number between 0 and 100, got '{}'",
            raw
        ))),
    }
}
