/// 允许上传的文件扩展名
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const WINDOWS_DEVICE_FILES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 检查文件扩展名（最后一个点之后，不区分大小写）
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// 清理客户端提供的文件名，使其可以安全地写入上传目录
///
/// 路径分隔符视为空白，空白序列合并为 `_`，只保留 `[A-Za-z0-9_.-]`，
/// 去掉首尾的 `.` 和 `_`。结果可能为空字符串。
pub fn secure_filename(filename: &str) -> String {
    let separated: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = separated.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = cleaned.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if !cleaned.is_empty() && WINDOWS_DEVICE_FILES.contains(&stem.as_str()) {
        return format!("_{}", cleaned);
    }

    cleaned
}
