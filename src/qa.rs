//! Q&A Adapter: free-text question in, explanation and optional
//! illustration out.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ai::Assistant;

/// Extension of illustration files in the images directory.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Whether the caller should show an illustration next to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ImageReference {
    Show(PathBuf),
    Hide,
}

impl ImageReference {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageReference::Show(path) => Some(path),
            ImageReference::Hide => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaAnswer {
    pub answer: String,
    pub image: ImageReference,
}

/// Lookup of static illustrations keyed by the normalized question.
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    dir: PathBuf,
}

impl ImageLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the illustration for `query`, if the file exists.
    pub fn get_image_path(&self, query: &str) -> Option<PathBuf> {
        let key = image_key(query)?;
        let path = self.dir.join(format!("{key}.{IMAGE_EXTENSION}"));
        path.is_file().then_some(path)
    }

    pub fn lookup(&self, query: &str) -> ImageReference {
        match self.get_image_path(query) {
            Some(path) => ImageReference::Show(path),
            None => ImageReference::Hide,
        }
    }
}

/// Uppercased, trimmed query. Keys that could leave the images directory
/// are rejected.
pub fn image_key(query: &str) -> Option<String> {
    let key = query.trim().to_uppercase();
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
        || key.contains('\0')
    {
        return None;
    }
    Some(key)
}

#[derive(Clone)]
pub struct QaService {
    assistant: Assistant,
    images: ImageLibrary,
}

impl QaService {
    pub fn new(assistant: Assistant, images: ImageLibrary) -> Self {
        Self { assistant, images }
    }

    pub fn images(&self) -> &ImageLibrary {
        &self.images
    }

    /// Ask the model and look up an illustration. The lookup never affects
    /// the answer text.
    pub fn ask(&self, question: &str) -> QaAnswer {
        let answer = self.assistant.answer_question(question);
        let image = self.images.lookup(question);
        tracing::debug!(has_image = image.path().is_some(), "Question answered");
        QaAnswer { answer, image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockLlmClient, ANSWER_ERROR_PREFIX};
    use std::sync::Arc;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, ImageLibrary) {
        let tmp = tempfile::tempdir().unwrap();
        for f in files {
            std::fs::write(tmp.path().join(f), b"\xFF\xD8\xFF").unwrap();
        }
        let lib = ImageLibrary::new(tmp.path());
        (tmp, lib)
    }

    #[test]
    fn present_image_is_found() {
        let (tmp, lib) = library_with(&["GB20.jpg"]);
        assert_eq!(lib.get_image_path("GB20"), Some(tmp.path().join("GB20.jpg")));
    }

    #[test]
    fn absent_image_is_none() {
        let (_tmp, lib) = library_with(&[]);
        assert_eq!(lib.get_image_path("GB20"), None);
        assert_eq!(lib.lookup("GB20"), ImageReference::Hide);
    }

    #[test]
    fn query_is_trimmed_and_uppercased() {
        let (tmp, lib) = library_with(&["LI4.jpg"]);
        assert_eq!(
            lib.lookup("  li4 \n"),
            ImageReference::Show(tmp.path().join("LI4.jpg"))
        );
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert_eq!(image_key("../secret"), None);
        assert_eq!(image_key("a/b"), None);
        assert_eq!(image_key("a\\b"), None);
        assert_eq!(image_key("   "), None);
        assert_eq!(image_key(" st36 ").as_deref(), Some("ST36"));
    }

    #[test]
    fn directory_with_image_name_is_not_an_image() {
        let (tmp, lib) = library_with(&[]);
        std::fs::create_dir(tmp.path().join("SP6.jpg")).unwrap();
        assert_eq!(lib.get_image_path("sp6"), None);
    }

    #[test]
    fn ask_returns_answer_and_image() {
        let (tmp, lib) = library_with(&["GB20.jpg"]);
        let svc = QaService::new(
            Assistant::new(Arc::new(MockLlmClient::new("GB20 Fengchi noktasıdır."))),
            lib,
        );
        let result = svc.ask("gb20");
        assert_eq!(result.answer, "GB20 Fengchi noktasıdır.");
        assert_eq!(result.image, ImageReference::Show(tmp.path().join("GB20.jpg")));
    }

    #[test]
    fn failed_answer_still_gets_image() {
        let (_tmp, lib) = library_with(&["GB20.jpg"]);
        let svc = QaService::new(
            Assistant::new(Arc::new(MockLlmClient::failing(500, "down"))),
            lib,
        );
        let result = svc.ask("GB20");
        assert!(result.answer.starts_with(ANSWER_ERROR_PREFIX));
        assert!(result.image.path().is_some());
    }

    #[test]
    fn image_reference_serializes_as_tagged() {
        let json = serde_json::to_value(ImageReference::Hide).unwrap();
        assert_eq!(json["kind"], "hide");
        let json = serde_json::to_value(ImageReference::Show(PathBuf::from("images/GB20.jpg")))
            .unwrap();
        assert_eq!(json["kind"], "show");
        assert_eq!(json["path"], "images/GB20.jpg");
    }
}
