use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

/// 存放一次性提示消息的cookie名
pub const FLASH_COOKIE: &str = "leafscan_flash";

/// 跨一次重定向的提示消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

impl FlashMessage {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: "danger".to_string(),
            message: message.into(),
        }
    }
}

/// 生成写入消息的 Set-Cookie 值
pub fn set_cookie(messages: &[FlashMessage]) -> Option<HeaderValue> {
    let payload = serde_json::to_string(messages).ok()?;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        urlencoding::encode(&payload)
    );
    HeaderValue::from_str(&cookie).ok()
}

/// 生成清除消息的 Set-Cookie 值
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("leafscan_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// 从请求头读取待显示的消息
pub fn read(headers: &HeaderMap) -> Vec<FlashMessage> {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .map(|(_, value)| value.to_string());

    let Some(raw) = raw else {
        return Vec::new();
    };

    let decoded = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Ignoring malformed flash cookie: {}", e);
            return Vec::new();
        }
    };

    serde_json::from_str(&decoded).unwrap_or_else(|e| {
        tracing::debug!("Ignoring malformed flash cookie: {}", e);
        Vec::new()
    })
}

/// 追加提示消息（保留请求中尚未显示的消息）并重定向
pub fn redirect_with_flash(location: &str, headers: &HeaderMap, message: FlashMessage) -> Response {
    let mut messages = read(headers);
    messages.push(message);

    let mut response = Redirect::to(location).into_response();
    if let Some(cookie) = set_cookie(&messages) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn cookie_header(set_cookie: &HeaderValue) -> HeaderMap {
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}", pair)).unwrap(),
        );
        headers
    }

    #[test]
    fn messages_survive_cookie_round_trip() {
        let messages = vec![FlashMessage::danger("Prediction error: bad; \"input\"")];
        let headers = cookie_header(&set_cookie(&messages).unwrap());

        assert_eq!(read(&headers), messages);
    }

    #[test]
    fn missing_or_garbled_cookie_yields_nothing() {
        assert!(read(&HeaderMap::new()).is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("leafscan_flash=%7Bnot-json"),
        );
        assert!(read(&headers).is_empty());
    }

    #[test]
    fn redirect_sets_cookie() {
        let response =
            redirect_with_flash("/", &HeaderMap::new(), FlashMessage::danger("No file part"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("leafscan_flash="));
    }

    #[test]
    fn redirect_appends_to_pending_messages() {
        let pending = vec![FlashMessage::danger("No file part")];
        let headers = cookie_header(&set_cookie(&pending).unwrap());

        let response = redirect_with_flash("/", &headers, FlashMessage::danger("No selected file"));
        let next = cookie_header(&response.headers()[header::SET_COOKIE]);

        assert_eq!(
            read(&next),
            vec![
                FlashMessage::danger("No file part"),
                FlashMessage::danger("No selected file"),
            ]
        );
    }
}
