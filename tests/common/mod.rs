//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use leafscan::{
    config::{Config, ModelConfig},
    image::{InputSize, TensorLayout},
    models::{LabelSet, ModelManager, Predictor},
    web::{create_app, AppState},
    ClassifyError,
};
use ndarray::Array4;
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "leafscan-test-boundary";

/// In-memory predictor returning fixed scores and recording the input shapes it saw.
pub struct FakePredictor {
    pub size: InputSize,
    pub layout: TensorLayout,
    pub scores: Vec<f32>,
    pub seen_shapes: Mutex<Vec<Vec<usize>>>,
    pub fail: bool,
}

impl FakePredictor {
    pub fn new(size: InputSize, scores: Vec<f32>) -> Self {
        Self {
            size,
            layout: TensorLayout::Nhwc,
            scores,
            seen_shapes: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(size: InputSize) -> Self {
        Self {
            fail: true,
            ..Self::new(size, Vec::new())
        }
    }
}

impl Predictor for FakePredictor {
    fn input_size(&self) -> InputSize {
        self.size
    }

    fn layout(&self) -> TensorLayout {
        self.layout
    }

    fn predict(&self, input: Array4<f32>) -> leafscan::Result<Vec<f32>> {
        self.seen_shapes.lock().push(input.shape().to_vec());
        if self.fail {
            return Err(ClassifyError::Inference("fake model exploded".to_string()));
        }
        Ok(self.scores.clone())
    }

    fn name(&self) -> &str {
        "fake.onnx"
    }
}

pub struct TestApp {
    pub app: Router,
    pub predictor: Arc<FakePredictor>,
    pub config: Config,
    // Keeps the static directory alive for the duration of the test.
    pub _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    Config::new(
        "127.0.0.1:0".to_string(),
        dir.path().join("model.onnx").to_string_lossy().into_owned(),
        dir.path().join("labels.txt").to_string_lossy().into_owned(),
        dir.path().join("static").to_string_lossy().into_owned(),
        false,
    )
    .unwrap()
}

pub fn manager(predictor: Arc<FakePredictor>, labels: &str) -> ModelManager {
    ModelManager::new(predictor, LabelSet::parse(labels), ModelConfig::default())
}

pub fn test_app(predictor: FakePredictor, labels: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    build_test_app(dir, config, predictor, labels)
}

/// Same as [`test_app`] but with a custom request body limit.
pub fn test_app_with_body_limit(predictor: FakePredictor, labels: &str, limit: usize) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.server_config.max_request_size = limit;
    build_test_app(dir, config, predictor, labels)
}

fn build_test_app(dir: TempDir, config: Config, predictor: FakePredictor, labels: &str) -> TestApp {
    std::fs::create_dir_all(config.upload_dir()).unwrap();

    let predictor = Arc::new(predictor);
    let state = AppState::new(config.clone(), manager(Arc::clone(&predictor), labels)).unwrap();

    TestApp {
        app: create_app(state),
        predictor,
        config,
        _dir: dir,
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x * 5) as u8, (y * 5) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Builds a single-field multipart body.
pub fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
