//! Composer state machine.
//!
//! `Idle` until there is draft text or an attachment, `Ready` while a draft
//! exists, `Submitting` while a create is in flight. A successful submit clears
//! the draft and attachment; a failed one keeps them and records the error.

use crate::components::preview::{PreviewHandle, PreviewStore};
use crate::error::AppError;
use crate::models::{MediaFile, Post, MAX_BODY_CHARS, MAX_UPLOADER_NAME_CHARS};
use crate::services::media::{is_allowed_type, MAX_FILE_SIZE};
use crate::services::{PostDraft, PostRepository};
use std::sync::Arc;
use thiserror::Error;

pub const GENERIC_SUBMIT_ERROR: &str =
    "An error occurred while creating the post. Please try again.";

/// User-visible composer errors; `Display` is the message shown inline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error("Unsupported file type. Please upload an image or video.")]
    UnsupportedFileType,

    #[error("File too large (max 50MB)")]
    FileTooLarge,

    #[error("Message is too long (maximum 280 characters)")]
    BodyTooLong,

    #[error("Please write something or attach a file before sharing")]
    EmptyPost,

    #[error("Please enter your name")]
    NameRequired,

    #[error("Name is too long (maximum 50 characters)")]
    NameTooLong,

    #[error("Failed to delete post. Please try again.")]
    DeleteFailed,

    /// Create failed after validation passed
    #[error("{0}")]
    Submit(String),
}

impl From<ComposerError> for AppError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Submit(msg) => AppError::Backend(msg),
            ComposerError::DeleteFailed => AppError::Backend(err.to_string()),
            ComposerError::UnsupportedFileType => AppError::UnsupportedMedia(err.to_string()),
            ComposerError::FileTooLarge => AppError::MediaTooLarge(err.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerPhase {
    Idle,
    Ready,
    Submitting,
}

/// A key event delivered to the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    /// Platform submit modifier (Ctrl, or Cmd on macOS)
    pub modifier: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, modifier: bool) -> Self {
        Self {
            key: key.into(),
            modifier,
        }
    }

    pub fn is_submit_shortcut(&self) -> bool {
        self.modifier && self.key == "Enter"
    }
}

#[derive(Debug)]
struct Attachment {
    file: MediaFile,
    preview: PreviewHandle,
}

pub struct Composer {
    previews: Arc<dyn PreviewStore>,
    body: String,
    uploader_name: String,
    attachment: Option<Attachment>,
    dragging: bool,
    submitting: bool,
    error: Option<String>,
}

impl Composer {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            previews,
            body: String::new(),
            uploader_name: String::new(),
            attachment: None,
            dragging: false,
            submitting: false,
            error: None,
        }
    }

    pub fn phase(&self) -> ComposerPhase {
        if self.submitting {
            ComposerPhase::Submitting
        } else if !self.body.is_empty() || self.attachment.is_some() {
            ComposerPhase::Ready
        } else {
            ComposerPhase::Idle
        }
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn set_uploader_name(&mut self, name: impl Into<String>) {
        self.uploader_name = name.into();
    }

    /// Attach a file after checking its type and size.
    ///
    /// A rejected file records the error and leaves the current attachment in place.
    pub fn select_file(&mut self, file: MediaFile) -> Result<(), ComposerError> {
        if let Err(err) = check_file(&file) {
            self.error = Some(err.to_string());
            return Err(err);
        }

        let preview = PreviewHandle::acquire(self.previews.clone(), &file);
        self.attachment = Some(Attachment { file, preview });
        self.error = None;
        Ok(())
    }

    pub fn drag_enter(&mut self) {
        self.dragging = true;
    }

    /// `left_zone` is true when the drag left the drop zone itself rather
    /// than one of its children
    pub fn drag_leave(&mut self, left_zone: bool) {
        if left_zone {
            self.dragging = false;
        }
    }

    /// Clear the drag indicator and select the first dropped file, if any
    pub fn drop_files(&mut self, files: Vec<MediaFile>) -> Result<(), ComposerError> {
        self.dragging = false;
        match files.into_iter().next() {
            Some(file) => self.select_file(file),
            None => Ok(()),
        }
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Run every pre-submit check in order, stopping at the first failure
    pub fn validate(&self) -> Result<(), ComposerError> {
        if let Some(attachment) = &self.attachment {
            check_file(&attachment.file)?;
        }

        if self.body.chars().count() > MAX_BODY_CHARS {
            return Err(ComposerError::BodyTooLong);
        }

        if self.body.trim().is_empty() && self.attachment.is_none() {
            return Err(ComposerError::EmptyPost);
        }

        let name = self.uploader_name.trim();
        if name.is_empty() {
            return Err(ComposerError::NameRequired);
        }
        if name.chars().count() > MAX_UPLOADER_NAME_CHARS {
            return Err(ComposerError::NameTooLong);
        }

        Ok(())
    }

    /// Validate, then create the post through `repo`
    pub async fn submit(&mut self, repo: &dyn PostRepository) -> Result<Post, ComposerError> {
        if let Err(err) = self.validate() {
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.submitting = true;
        self.error = None;

        let draft = PostDraft {
            body: self.body.trim().to_string(),
            uploader_name: Some(self.uploader_name.trim().to_string()),
            file: self.attachment.as_ref().map(|a| a.file.clone()),
        };

        let result = repo.create_post(draft).await;
        self.submitting = false;

        match result {
            Ok(post) => {
                self.body.clear();
                self.attachment = None;
                Ok(post)
            }
            Err(e) => {
                let message = match e.message().trim() {
                    "" => GENERIC_SUBMIT_ERROR.to_string(),
                    msg => msg.to_string(),
                };
                tracing::error!(error = %e, "post submission failed");
                self.error = Some(message.clone());
                Err(ComposerError::Submit(message))
            }
        }
    }

    /// Modifier+Enter submits; any other key is ignored
    pub async fn on_key_down(
        &mut self,
        key: &KeyPress,
        repo: &dyn PostRepository,
    ) -> Option<Result<Post, ComposerError>> {
        if !key.is_submit_shortcut() {
            return None;
        }
        Some(self.submit(repo).await)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn uploader_name(&self) -> &str {
        &self.uploader_name
    }

    /// Characters used, for the `n/280` counter
    pub fn char_count(&self) -> usize {
        self.body.chars().count()
    }

    pub fn attachment(&self) -> Option<&MediaFile> {
        self.attachment.as_ref().map(|a| &a.file)
    }

    pub fn preview_reference(&self) -> Option<&str> {
        self.attachment.as_ref().map(|a| a.preview.reference())
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

fn check_file(file: &MediaFile) -> Result<(), ComposerError> {
    if !is_allowed_type(&file.content_type) {
        return Err(ComposerError::UnsupportedFileType);
    }
    if file.size() > MAX_FILE_SIZE {
        return Err(ComposerError::FileTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::preview::PreviewRegistry;
    use crate::models::MediaKind;
    use crate::services::posts::MockPostRepository;
    use bytes::Bytes;
    use chrono::Utc;

    fn composer() -> (Composer, Arc<PreviewRegistry>) {
        let registry = Arc::new(PreviewRegistry::new());
        (Composer::new(registry.clone()), registry)
    }

    fn file_of(name: &str, content_type: &str, size: usize) -> MediaFile {
        MediaFile::new(name, content_type, Bytes::from(vec![0u8; size]))
    }

    fn echo_post(draft: &PostDraft) -> Post {
        Post {
            id: "1".into(),
            body: draft.body.clone(),
            timestamp: Utc::now(),
            media: draft.file.as_ref().map(|f| crate::models::MediaRef {
                url: format!("https://cdn/{}", f.name),
                kind: f.kind(),
            }),
            uploader_name: draft.uploader_name.clone().unwrap_or_default(),
        }
    }

    #[test]
    fn test_phases() {
        let (mut composer, _) = composer();
        assert_eq!(composer.phase(), ComposerPhase::Idle);
        composer.set_body("hi");
        assert_eq!(composer.phase(), ComposerPhase::Ready);
    }

    #[test]
    fn test_body_length_boundary() {
        let (mut composer, _) = composer();
        composer.set_uploader_name("James");

        composer.set_body("a".repeat(280));
        assert_eq!(composer.validate(), Ok(()));

        composer.set_body("a".repeat(281));
        assert_eq!(composer.validate(), Err(ComposerError::BodyTooLong));
    }

    #[test]
    fn test_body_length_counts_characters_not_bytes() {
        let (mut composer, _) = composer();
        composer.set_uploader_name("James");
        composer.set_body("é".repeat(280));
        assert_eq!(composer.validate(), Ok(()));
        assert_eq!(composer.char_count(), 280);
    }

    #[test]
    fn test_unsupported_type_wins_over_size() {
        let (mut composer, registry) = composer();
        let err = composer
            .select_file(file_of("doc.pdf", "application/pdf", MAX_FILE_SIZE + 1))
            .unwrap_err();
        assert_eq!(err, ComposerError::UnsupportedFileType);
        assert_eq!(
            composer.error(),
            Some("Unsupported file type. Please upload an image or video.")
        );
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_size_boundary() {
        let (mut composer, _) = composer();
        assert_eq!(
            composer.select_file(file_of("big.mp4", "video/mp4", MAX_FILE_SIZE + 1)),
            Err(ComposerError::FileTooLarge)
        );
        assert_eq!(
            composer.select_file(file_of("big.mp4", "video/mp4", MAX_FILE_SIZE)),
            Ok(())
        );
        assert!(composer.error().is_none());
    }

    #[test]
    fn test_rejected_file_keeps_previous_attachment() {
        let (mut composer, registry) = composer();
        composer
            .select_file(file_of("a.png", "image/png", 10))
            .unwrap();
        let reference = composer.preview_reference().map(str::to_string);

        assert!(composer
            .select_file(file_of("b.txt", "text/plain", 10))
            .is_err());
        assert_eq!(composer.attachment().map(|f| f.name.as_str()), Some("a.png"));
        assert_eq!(composer.preview_reference().map(str::to_string), reference);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_replacing_attachment_releases_old_preview() {
        let (mut composer, registry) = composer();
        composer.select_file(file_of("a.png", "image/png", 1)).unwrap();
        composer.select_file(file_of("b.gif", "image/gif", 1)).unwrap();
        assert_eq!(registry.live_count(), 1);

        composer.clear_attachment();
        assert_eq!(registry.live_count(), 0);
        assert_eq!(composer.phase(), ComposerPhase::Idle);
    }

    #[test]
    fn test_dropping_composer_releases_preview() {
        let (mut composer, registry) = composer();
        composer.select_file(file_of("a.png", "image/png", 1)).unwrap();
        drop(composer);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_drag_indicator() {
        let (mut composer, _) = composer();
        composer.drag_enter();
        assert!(composer.is_dragging());
        composer.drag_leave(false);
        assert!(composer.is_dragging());
        composer.drag_leave(true);
        assert!(!composer.is_dragging());

        composer.drag_enter();
        composer
            .drop_files(vec![
                file_of("first.webp", "image/webp", 1),
                file_of("second.png", "image/png", 1),
            ])
            .unwrap();
        assert!(!composer.is_dragging());
        assert_eq!(
            composer.attachment().map(|f| f.name.as_str()),
            Some("first.webp")
        );
    }

    #[test]
    fn test_validation_order() {
        let (mut composer, _) = composer();
        assert_eq!(composer.validate(), Err(ComposerError::EmptyPost));

        composer.set_body("   ");
        assert_eq!(composer.validate(), Err(ComposerError::EmptyPost));

        composer.set_body("hello");
        assert_eq!(composer.validate(), Err(ComposerError::NameRequired));

        composer.set_uploader_name("  ");
        assert_eq!(composer.validate(), Err(ComposerError::NameRequired));

        composer.set_uploader_name("x".repeat(51));
        assert_eq!(composer.validate(), Err(ComposerError::NameTooLong));

        composer.set_uploader_name("x".repeat(50));
        assert_eq!(composer.validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_invalid_submit_makes_no_call() {
        let (mut composer, _) = composer();
        let mut repo = MockPostRepository::new();
        repo.expect_create_post().never();

        composer.set_body("a".repeat(281));
        composer.set_uploader_name("James");
        let err = composer.submit(&repo).await.unwrap_err();

        assert_eq!(err, ComposerError::BodyTooLong);
        assert_eq!(
            composer.error(),
            Some("Message is too long (maximum 280 characters)")
        );
    }

    #[tokio::test]
    async fn test_successful_submit_clears_draft() {
        let (mut composer, registry) = composer();
        let mut repo = MockPostRepository::new();
        repo.expect_create_post()
            .withf(|draft| {
                draft.body.is_empty()
                    && draft.uploader_name.as_deref() == Some("James")
                    && draft.file.is_some()
            })
            .times(1)
            .returning(|draft| Ok(echo_post(&draft)));

        composer.set_body("  ");
        composer.set_uploader_name(" James ");
        composer.select_file(file_of("clip.mp4", "video/mp4", 3)).unwrap();

        let post = composer.submit(&repo).await.unwrap();
        assert_eq!(post.media.map(|m| m.kind), Some(MediaKind::Video));
        assert_eq!(composer.phase(), ComposerPhase::Idle);
        assert!(composer.attachment().is_none());
        assert_eq!(composer.uploader_name(), " James ");
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft() {
        let (mut composer, _) = composer();
        let mut repo = MockPostRepository::new();
        repo.expect_create_post()
            .returning(|_| Err(AppError::Backend(String::new())));

        composer.set_body("Hello wall");
        composer.set_uploader_name("James");

        let err = composer.submit(&repo).await.unwrap_err();
        assert_eq!(err, ComposerError::Submit(GENERIC_SUBMIT_ERROR.to_string()));
        assert_eq!(composer.body(), "Hello wall");
        assert_eq!(composer.error(), Some(GENERIC_SUBMIT_ERROR));
        assert_eq!(composer.phase(), ComposerPhase::Ready);
    }

    #[tokio::test]
    async fn test_keyboard_shortcut_submits() {
        let (mut composer, _) = composer();
        let mut repo = MockPostRepository::new();
        repo.expect_create_post()
            .times(1)
            .returning(|draft| Ok(echo_post(&draft)));

        composer.set_body("shortcut");
        composer.set_uploader_name("James");

        assert!(composer
            .on_key_down(&KeyPress::new("Enter", false), &repo)
            .await
            .is_none());
        let submitted = composer
            .on_key_down(&KeyPress::new("Enter", true), &repo)
            .await;
        assert_eq!(submitted.map(|r| r.map(|p| p.body)), Some(Ok("shortcut".to_string())));
    }

    #[test]
    fn test_errors_map_to_app_errors() {
        assert_eq!(
            AppError::from(ComposerError::EmptyPost),
            AppError::Validation(
                "Please write something or attach a file before sharing".to_string()
            )
        );
        assert_eq!(
            AppError::from(ComposerError::Submit("boom".into())),
            AppError::Backend("boom".into())
        );
        assert_eq!(
            AppError::from(ComposerError::FileTooLarge),
            AppError::MediaTooLarge("File too large (max 50MB)".into())
        );
        assert_eq!(
            AppError::from(ComposerError::UnsupportedFileType),
            AppError::UnsupportedMedia(
                "Unsupported file type. Please upload an image or video.".into()
            )
        );
    }
}
