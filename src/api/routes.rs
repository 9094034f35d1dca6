//! HTTP route handlers for Axum.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::{
    api::types::{MessageDto, UploadForm},
    errors::PipelineError,
    nlp::mask::AnonMask,
    pipeline::{self, PipelineOutput},
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn reject(err: PipelineError) -> (StatusCode, String) {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "upload failed");
    }
    (status, err.to_string())
}

pub async fn root() -> Json<MessageDto> {
    Json(MessageDto {
        message: "note-classifier: POST a notes CSV to /upload".into(),
    })
}

pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<PipelineOutput> {
    info!("processing file upload");
    let form = read_form(multipart).await?;
    let Some(file) = form.file else {
        return Err((
            StatusCode::BAD_REQUEST,
            "missing required multipart field 'file'".into(),
        ));
    };
    let anon_mask = match form.anon_mask_file.filter(|bytes| !bytes.is_empty()) {
        Some(bytes) => AnonMask::from_json(&bytes).map_err(reject)?,
        None => {
            info!("using default anon mask");
            state.default_mask.clone()
        }
    };
    let overwrite = form
        .overwrite
        .as_deref()
        .map(pipeline::parse_flag)
        .unwrap_or(false);
    let notes = pipeline::parse_notes(&file).map_err(reject)?;
    info!(notes = notes.len(), overwrite, "running model");

    // Held by the blocking task so a dropped request cannot release it early.
    let guard = state.gate.clone().lock_owned().await;
    let ctx = state.pipeline.clone();
    let output = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        pipeline::run_pipeline(&ctx, &notes, anon_mask, overwrite)
    })
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
    .map_err(reject)?;
    info!(
        predictions = output.predictions.len(),
        "file processed successfully"
    );
    Ok(Json(output))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, (StatusCode, String)> {
    let multipart_error =
        |err: axum::extract::multipart::MultipartError| (err.status(), err.body_text());
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => form.file = Some(field.bytes().await.map_err(multipart_error)?.to_vec()),
            "anon_mask_file" => {
                form.anon_mask_file = Some(field.bytes().await.map_err(multipart_error)?.to_vec())
            }
            "overwrite" => form.overwrite = Some(field.text().await.map_err(multipart_error)?),
            other => info!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}
