use crate::{classify::Prediction, web::flash::FlashMessage, Result};
use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

const INDEX_TEMPLATE: &str = "index.html";

/// 构建模板环境（模板编译进二进制）
pub fn build_templates() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
    Ok(env)
}

/// 首页视图数据
#[derive(Debug, Default, Serialize)]
pub struct IndexView {
    pub messages: Vec<FlashMessage>,
    pub filename: Option<String>,
    pub results: Option<Vec<ResultRow>>,
}

/// 结果表格中的一行
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub label: String,
    pub confidence: f32,
    pub percent: String,
}

impl From<&Prediction> for ResultRow {
    fn from(prediction: &Prediction) -> Self {
        Self {
            label: prediction.label.clone(),
            confidence: prediction.confidence,
            percent: format!("{:.2}%", prediction.confidence * 100.0),
        }
    }
}

impl IndexView {
    pub fn with_messages(messages: Vec<FlashMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_results(filename: &str, predictions: &[Prediction]) -> Self {
        Self {
            messages: Vec::new(),
            filename: Some(filename.to_string()),
            results: Some(predictions.iter().map(ResultRow::from).collect()),
        }
    }
}

/// 渲染首页
pub fn render_index(env: &Environment<'static>, view: &IndexView) -> Result<Html<String>> {
    let template = env.get_template(INDEX_TEMPLATE)?;
    let html = template.render(view)?;
    Ok(Html(html))
}
