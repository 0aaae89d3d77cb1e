// Multipart form processing for the diarization API
//
// Extracts the uploaded audio file from the multipart request into a unique
// per-request directory, enforcing the configured size cap and cleaning up
// partial uploads on error.

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};

use crate::config::{HandlerConfig, JobPaths};
use crate::error::HandlerError;
use crate::file_utils::{generate_unique_job_paths, save_file_data};

/// Extract the uploaded audio from the multipart form.
///
/// The client sends the clip in a field named `file` (anything ffmpeg can
/// decode). Unknown fields are drained and ignored.
pub async fn extract_upload(
    mut form: Multipart,
    config: &HandlerConfig,
) -> Result<JobPaths, HandlerError> {
    let mut job_paths: Option<JobPaths> = None;

    // Ensure the temp directory exists
    config.ensure_temp_dir().map_err(|e| {
        error!("Failed to create temp directory: {}", e);
        HandlerError::FileError(e)
    })?;

    while let Ok(Some(mut field)) = form.try_next().await {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .and_then(|cd| cd.get_name().map(|name| name.to_string()))
            .unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if job_paths.is_some() {
                    // Only the first file field counts
                    while field.next().await.is_some() {}
                    continue;
                }

                let paths = generate_unique_job_paths(&config.temp_dir).map_err(|e| {
                    error!("Failed to create unique directory: {}", e);
                    HandlerError::FileError(e)
                })?;

                let mut total_size = 0;
                let mut file_data = Vec::new();

                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| {
                        HandlerError::form_error(format!("Error processing file upload: {}", e))
                            .with_cleanup(Some(&paths.folder))
                    })?;

                    total_size += data.len();
                    if total_size > config.max_file_size {
                        return Err(HandlerError::FileTooLarge(
                            total_size,
                            config.max_file_size,
                        )
                        .with_cleanup(Some(&paths.folder)));
                    }

                    file_data.extend_from_slice(&data);
                }

                save_file_data(&file_data, &paths.raw_file)
                    .map_err(|e| HandlerError::FileError(e).with_cleanup(Some(&paths.folder)))?;

                info!(
                    "Request {}: saved {} byte upload to {}",
                    paths.id,
                    total_size,
                    paths.raw_file.display()
                );
                job_paths = Some(paths);
            }
            _ => {
                // Drain and skip unknown fields
                while field.next().await.is_some() {}
            }
        }
    }

    job_paths.ok_or(HandlerError::NoAudioFile)
}
