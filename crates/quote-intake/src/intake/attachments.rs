//! Client-side photo intake for step 4.
//!
//! Candidates are filtered by type and size, then appended until the set holds
//! [`MAX_ATTACHMENTS`] entries. Anything beyond the cap is dropped, not queued.

use std::sync::atomic::{AtomicU64, Ordering};

use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::AttachmentSummary;

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

static PREVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Display-only handle for a locally held file. Never part of the submitted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewHandle(pub String);

impl PreviewHandle {
    fn issue() -> Self {
        let id = PREVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        PreviewHandle(format!("blob:quote-intake/{id}"))
    }
}

/// A file offered through the picker or a drop event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentCandidate {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// An accepted image held in memory until submit.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime: Mime,
    pub preview: PreviewHandle,
}

impl Attachment {
    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            file_name: self.file_name.clone(),
            size_bytes: self.size_bytes,
        }
    }

    pub fn view(&self) -> AttachmentView {
        AttachmentView {
            file_name: self.file_name.clone(),
            size_bytes: self.size_bytes,
            mime_type: self.mime.essence_str().to_string(),
            preview_url: self.preview.0.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentView {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub preview_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotAnImage,
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedAttachment {
    pub file_name: String,
    pub reason: RejectionReason,
}

/// What happened to each candidate of one selection event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentIntake {
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedAttachment>,
    pub dropped_over_cap: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("attachment index {index} out of range for {len} attachments")]
pub struct AttachmentIndexError {
    pub index: usize,
    pub len: usize,
}

/// Ordered, capped list of accepted images.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    entries: Vec<Attachment>,
}

impl AttachmentSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.entries.iter()
    }

    pub fn add<I>(&mut self, candidates: I) -> AttachmentIntake
    where
        I: IntoIterator<Item = AttachmentCandidate>,
    {
        let mut intake = AttachmentIntake::default();

        for candidate in candidates {
            let mime = match screen(&candidate) {
                Ok(mime) => mime,
                Err(reason) => {
                    intake.rejected.push(RejectedAttachment {
                        file_name: candidate.file_name,
                        reason,
                    });
                    continue;
                }
            };

            if self.entries.len() >= MAX_ATTACHMENTS {
                intake.dropped_over_cap.push(candidate.file_name);
                continue;
            }

            intake.accepted.push(candidate.file_name.clone());
            self.entries.push(Attachment {
                file_name: candidate.file_name,
                size_bytes: candidate.size_bytes,
                mime,
                preview: PreviewHandle::issue(),
            });
        }

        intake
    }

    /// Remove by position; later entries move up by one.
    pub fn remove(&mut self, index: usize) -> Result<Attachment, AttachmentIndexError> {
        if index >= self.entries.len() {
            return Err(AttachmentIndexError {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summaries(&self) -> Vec<AttachmentSummary> {
        self.entries.iter().map(Attachment::summary).collect()
    }

    pub fn views(&self) -> Vec<AttachmentView> {
        self.entries.iter().map(Attachment::view).collect()
    }
}

fn screen(candidate: &AttachmentCandidate) -> Result<Mime, RejectionReason> {
    let mime: Mime = candidate
        .mime_type
        .trim()
        .parse()
        .map_err(|_| RejectionReason::NotAnImage)?;
    if mime.type_() != mime::IMAGE {
        return Err(RejectionReason::NotAnImage);
    }
    if candidate.size_bytes > MAX_ATTACHMENT_BYTES {
        return Err(RejectionReason::TooLarge);
    }
    Ok(mime)
}
