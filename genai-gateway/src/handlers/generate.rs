//! The four generation endpoints.
//!
//! Each one builds `Contents` from the request, makes exactly one provider
//! call and answers `{ "result" }` or an `AppError`.

use crate::dtos::{GenerateTextRequest, GenerationResponse};
use crate::handlers::UploadForm;
use crate::services::content::{audio_contents, document_contents, image_contents, text_contents};
use crate::services::metrics;
use crate::services::providers::Contents;
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use service_core::error::AppError;
use std::time::Instant;

pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let Json(request) = payload.inspect_err(|_| reject("generate_text"))?;

    generate(&state, "generate_text", text_contents(request.prompt)).await
}

pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let (image, prompt) = async {
        let mut form = UploadForm::read(multipart?).await?;
        let image = form.take_file("image")?;
        Ok::<_, AppError>((image, form.take_text("prompt").unwrap_or_default()))
    }
    .await
    .inspect_err(|_| reject("generate_from_image"))?;

    generate(&state, "generate_from_image", image_contents(prompt, &image)).await
}

pub async fn generate_from_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let document = async { UploadForm::read(multipart?).await?.take_file("document") }
        .await
        .inspect_err(|_| reject("generate_from_document"))?;

    generate(&state, "generate_from_document", document_contents(&document)).await
}

pub async fn generate_from_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let audio = async { UploadForm::read(multipart?).await?.take_file("audio") }
        .await
        .inspect_err(|_| reject("generate_from_audio"))?;

    generate(&state, "generate_from_audio", audio_contents(&audio)).await
}

fn reject(operation: &str) {
    metrics::record_genai_request(operation, "rejected");
}

/// One provider call, timed and counted. Provider failures become
/// `AppError::Upstream` so the caller sees the backend's message.
async fn generate(
    state: &AppState,
    operation: &'static str,
    contents: Contents,
) -> Result<Json<GenerationResponse>, AppError> {
    let model = state.config.models.model.as_str();
    let provider = state.provider.as_ref();

    let start = Instant::now();
    let result = provider.generate(model, &contents).await;
    metrics::record_provider_latency(provider.name(), model, start.elapsed().as_secs_f64());

    match result {
        Ok(response) => {
            metrics::record_genai_request(operation, "success");
            tracing::info!(
                operation,
                model,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                finish_reason = response.finish_reason.as_str(),
                "Generation completed"
            );

            if response.text.is_none() {
                tracing::warn!(operation, model, "Provider returned no text");
            }

            Ok(Json(GenerationResponse {
                result: response.text.unwrap_or_default(),
            }))
        }
        Err(e) => {
            metrics::record_provider_error(provider.name(), e.kind());
            metrics::record_genai_request(operation, "error");
            tracing::error!(operation, model, error = %e, "Generation failed");
            Err(e.into())
        }
    }
}
