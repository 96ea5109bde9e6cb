use crate::{
    classify::{ClassificationPipeline, ClassificationResult},
    utils::{allowed_file, error::ClassifyError, secure_filename},
    web::{
        flash::{self, FlashMessage},
        ui::{self, IndexView},
        AppState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

/// 表单上传失败的原因，Display 即为展示给用户的提示
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Unsupported file format. Use png/jpg/jpeg.")]
    UnsupportedFormat,

    #[error("Upload error: {0}")]
    Upload(ClassifyError),

    #[error("Prediction error: {0}")]
    Prediction(ClassifyError),
}

impl From<UploadError> for ClassifyError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NoFilePart | UploadError::NoSelectedFile => {
                ClassifyError::InvalidInput(err.to_string())
            }
            UploadError::UnsupportedFormat => ClassifyError::UnsupportedFormat(err.to_string()),
            UploadError::Upload(e) | UploadError::Prediction(e) => e,
        }
    }
}

/// 已接收的上传图像
#[derive(Debug)]
pub struct UploadedImage {
    /// 清理后的文件名
    pub filename: String,
    pub data: Bytes,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 从multipart中读取 `image` 字段
pub async fn read_image_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<UploadedImage, UploadError> {
    // 非multipart请求等同于没有文件字段
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Request is not multipart: {}", e);
        UploadError::NoFilePart
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        UploadError::Upload(ClassifyError::InvalidInput(format!(
            "Failed to read multipart field: {}",
            e
        )))
    })? {
        if field.name() != Some("image") {
            tracing::debug!("Ignoring field: {:?}", field.name());
            continue;
        }

        // 没有文件名的同名字段是普通表单字段，不是文件
        let original = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if original.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }

        if !allowed_file(&original) {
            tracing::info!("Rejected upload with unsupported extension: {}", original);
            return Err(UploadError::UnsupportedFormat);
        }

        let filename = secure_filename(&original);
        if filename.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }

        let data = field.bytes().await.map_err(|e| {
            UploadError::Upload(ClassifyError::InvalidInput(format!(
                "Failed to read file data: {}",
                e
            )))
        })?;

        tracing::debug!("Received file: {} ({} bytes)", filename, data.len());
        return Ok(UploadedImage { filename, data });
    }

    Err(UploadError::NoFilePart)
}

/// 首页：显示上传表单和待显示的提示消息
pub async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let messages = flash::read(&headers);
    let had_messages = !messages.is_empty();

    let html = ui::render_index(&state.templates, &IndexView::with_messages(messages))?;

    let mut response = html.into_response();
    if had_messages {
        response
            .headers_mut()
            .append(header::SET_COOKIE, flash::clear_cookie());
    }
    Ok(response)
}

/// 表单上传：保存文件、分类并渲染结果
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let start_time = Instant::now();

    let result = match classify_upload(&state, multipart).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!("Upload rejected: {}", err);
            return flash::redirect_with_flash("/", &headers, FlashMessage::danger(err.to_string()));
        }
    };

    // 结果页同时显示并清除尚未显示的消息
    let mut view = IndexView::with_results(&result.filename, &result.predictions);
    view.messages = flash::read(&headers);
    let had_messages = !view.messages.is_empty();

    match ui::render_index(&state.templates, &view) {
        Ok(html) => {
            tracing::info!(
                "Upload classified: file={}, time={:.3}s",
                result.filename,
                start_time.elapsed().as_secs_f32()
            );
            let mut response = html.into_response();
            if had_messages {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, flash::clear_cookie());
            }
            response
        }
        Err(e) => {
            let err = UploadError::Prediction(e);
            tracing::error!("{}", err);
            flash::redirect_with_flash("/", &headers, FlashMessage::danger(err.to_string()))
        }
    }
}

async fn classify_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<ClassificationResult, UploadError> {
    let upload = read_image_field(multipart).await?;

    let save_path = state.config.upload_dir().join(&upload.filename);
    tokio::fs::write(&save_path, &upload.data)
        .await
        .map_err(|e| UploadError::Upload(ClassifyError::Io(e)))?;

    tracing::info!(
        "Saved upload to {} ({} bytes)",
        save_path.display(),
        upload.data.len()
    );

    ClassificationPipeline::process_path(state.models.clone(), &save_path, &upload.filename)
        .await
        .map_err(UploadError::Prediction)
}

/// 上传文件地址重定向到静态目录
pub async fn uploaded_file_handler(Path(filename): Path<String>) -> Response {
    let location = format!("/static/uploads/{}", urlencoding::encode(&filename));
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// JSON分类接口（multipart，字段 `image`）
pub async fn classify_api_handler(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ClassificationResult>>> {
    let upload = read_image_field(multipart).await?;

    tracing::info!(
        "Processing API classification: file={}, bytes={}",
        upload.filename,
        upload.data.len()
    );

    let result = ClassificationPipeline::process_bytes(
        state.models.clone(),
        upload.data.to_vec(),
        &upload.filename,
        state.config.server_config.max_request_size,
    )
    .await?;

    Ok(Json(ApiResponse::success(result)))
}
