use crate::commands::AppState;
use crate::models::{Notification, ProjectDescriptionForm, ProjectUploadForm};

pub async fn submit_project_description(
    state: &AppState,
    form: &ProjectDescriptionForm,
) -> Result<Notification, Notification> {
    state.submitter.submit_project_description(form).await?;
    Ok(Notification::success(
        "Project created successfully",
        "Your project description has been saved",
    ))
}

/// Submits the upload form together with the current file selection. The
/// selection is discarded once the record is written.
pub async fn submit_project_upload(
    state: &mut AppState,
    form: &ProjectUploadForm,
) -> Result<Notification, Notification> {
    let files = state.selected_files();
    let record = state.submitter.submit_project_upload(form, &files).await?;
    state.collector.clear();

    Ok(Notification::success(
        "Success!",
        &format!(
            "Project {} and {} file(s) have been uploaded",
            record.project_id,
            record.files.len()
        ),
    ))
}
