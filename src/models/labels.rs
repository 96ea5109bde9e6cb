use crate::utils::error::ClassifyError;
use crate::Result;
use std::borrow::Cow;
use std::path::Path;

/// 类别标签集合，下标与模型输出的类别索引一一对应
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// 从标签文件加载（每行一个标签，忽略空行）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClassifyError::LabelsLoad(format!(
                "Labels file not found at {}. Create one label per line.",
                path.display()
            )));
        }

        tracing::info!("Loading labels from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let labels = Self::parse(&content);

        tracing::info!("Loaded {} labels", labels.len());
        Ok(labels)
    }

    /// 解析标签文本
    pub fn parse(content: &str) -> Self {
        let labels = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 获取索引对应的标签，越界时返回占位名
    pub fn label_for(&self, index: usize) -> Cow<'_, str> {
        match self.labels.get(index) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("Class {}", index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_skips_blank_lines() {
        let labels = LabelSet::parse("  healthy \n\n rust\r\n\t\npowdery mildew\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label_for(0), "healthy");
        assert_eq!(labels.label_for(1), "rust");
        assert_eq!(labels.label_for(2), "powdery mildew");
    }

    #[test]
    fn out_of_range_index_gets_placeholder() {
        let labels = LabelSet::parse("a\nb\n");
        assert_eq!(labels.label_for(2), "Class 2");
        assert_eq!(LabelSet::default().label_for(0), "Class 0");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LabelSet::load(&dir.path().join("labels.txt")).unwrap_err();
        assert!(matches!(err, ClassifyError::LabelsLoad(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "apple scab\nblack rot\n").unwrap();

        let labels = LabelSet::load(&path).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.label_for(1), "black rot");
    }
}
