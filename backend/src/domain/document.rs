//! Document data model.
//!
//! A [`Document`] is created in [`DocumentStatus::Uploaded`] and only moves
//! through the transitions owned by
//! [`DocumentLifecycle`](super::DocumentLifecycle). The result payload is
//! present exactly when the status is [`DocumentStatus::Completed`]; the
//! constructors refuse any other combination.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::account::AccountId;

/// Validation errors raised by document constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentValidationError {
    /// Identifier is not a UUID.
    #[error("document id must be a valid UUID")]
    InvalidId,
    /// Filename was blank.
    #[error("filename must not be empty")]
    EmptyFilename,
    /// Filename exceeds `max` characters.
    #[error("filename must be at most {max} characters")]
    FilenameTooLong { max: usize },
    /// Filename contains separators or control characters.
    #[error("filename must not contain path separators or control characters")]
    FilenameInvalidCharacters,
    /// Extension is not `.pdf` or `.docx`.
    #[error("only PDF and DOCX files are allowed")]
    UnsupportedFileType,
    /// Stored status string is not recognised.
    #[error("unknown document status `{value}`")]
    UnknownStatus { value: String },
    /// Result text was blank.
    #[error("processing result must not be empty")]
    EmptyResult,
    /// Result presence disagrees with `status`.
    #[error("result must be present exactly when status is COMPLETED (status {status})")]
    ResultStatusMismatch { status: DocumentStatus },
    /// Storage location was blank.
    #[error("storage location must not be empty")]
    EmptyLocation,
}

/// Stable document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = DocumentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DocumentValidationError::InvalidId)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Processing status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Stored and waiting for a processing trigger.
    Uploaded,
    /// Processing has started and not yet finished.
    Processing,
    /// Processing finished with a result.
    Completed,
    /// Processing failed; the document may be triggered again.
    Failed,
}

impl DocumentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Uploaded,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];

    /// Statuses from which processing may (re)start.
    pub const STARTABLE: [Self; 2] = [Self::Uploaded, Self::Failed];

    /// Persisted and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether a processing trigger moves this status to `Processing`.
    pub fn can_start_processing(self) -> bool {
        Self::STARTABLE.contains(&self)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = DocumentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DocumentValidationError::UnknownStatus {
                value: s.to_owned(),
            })
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
}

impl DocumentFormat {
    /// Lowercase extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
        }
    }

    /// MIME type clients must declare for this format.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }

    /// Resolve a declared MIME type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        [Self::Pdf, Self::Docx]
            .into_iter()
            .find(|format| format.content_type().eq_ignore_ascii_case(content_type))
    }
}

/// Original client-supplied filename.
///
/// ## Invariants
/// - Trimmed, non-empty and at most [`DocumentFilename::MAX_CHARS`] long.
/// - No path separators or control characters.
/// - Ends in `.pdf` or `.docx`, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentFilename {
    name: String,
    format: DocumentFormat,
}

impl DocumentFilename {
    /// Longest accepted filename.
    pub const MAX_CHARS: usize = 255;

    /// Validate a client-supplied filename.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{DocumentFilename, DocumentFormat};
    ///
    /// let name = DocumentFilename::new("Report.PDF").unwrap();
    /// assert_eq!(name.format(), DocumentFormat::Pdf);
    /// assert!(DocumentFilename::new("notes.txt").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DocumentValidationError> {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(DocumentValidationError::EmptyFilename);
        }
        if name.chars().count() > Self::MAX_CHARS {
            return Err(DocumentValidationError::FilenameTooLong {
                max: Self::MAX_CHARS,
            });
        }
        if name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(DocumentValidationError::FilenameInvalidCharacters);
        }
        let lowered = name.to_ascii_lowercase();
        let format = [DocumentFormat::Pdf, DocumentFormat::Docx]
            .into_iter()
            .find(|format| {
                lowered.ends_with(format.extension()) && lowered.len() > format.extension().len()
            })
            .ok_or(DocumentValidationError::UnsupportedFileType)?;
        Ok(Self {
            name: name.to_owned(),
            format,
        })
    }

    /// Detected file format.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

impl AsRef<str> for DocumentFilename {
    fn as_ref(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for DocumentFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<DocumentFilename> for String {
    fn from(value: DocumentFilename) -> Self {
        value.name
    }
}

impl TryFrom<String> for DocumentFilename {
    type Error = DocumentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-empty processing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProcessingResult(String);

impl ProcessingResult {
    /// Wrap non-empty result text.
    pub fn new(text: impl Into<String>) -> Result<Self, DocumentValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DocumentValidationError::EmptyResult);
        }
        Ok(Self(text))
    }
}

impl AsRef<str> for ProcessingResult {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProcessingResult> for String {
    fn from(value: ProcessingResult) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProcessingResult {
    type Error = DocumentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque reference to stored file bytes, produced by a
/// [`FileStorage`](super::ports::FileStorage) adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredFileLocation(String);

impl StoredFileLocation {
    /// Wrap a non-empty location.
    pub fn new(raw: impl Into<String>) -> Result<Self, DocumentValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DocumentValidationError::EmptyLocation);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for StoredFileLocation {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StoredFileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw persisted fields used to rebuild a [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentParts {
    /// Document identifier.
    pub id: DocumentId,
    /// Owning account.
    pub owner: AccountId,
    /// Original filename.
    pub filename: DocumentFilename,
    /// Stored file reference.
    pub location: StoredFileLocation,
    /// Current status.
    pub status: DocumentStatus,
    /// Result, for completed documents.
    pub result: Option<ProcessingResult>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// Owned uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    owner: AccountId,
    filename: DocumentFilename,
    location: StoredFileLocation,
    status: DocumentStatus,
    result: Option<ProcessingResult>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    /// A freshly uploaded document.
    pub fn uploaded(
        owner: AccountId,
        filename: DocumentFilename,
        location: StoredFileLocation,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::random(),
            owner,
            filename,
            location,
            status: DocumentStatus::Uploaded,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a document, enforcing the status/result invariant.
    pub fn from_parts(parts: DocumentParts) -> Result<Self, DocumentValidationError> {
        let DocumentParts {
            id,
            owner,
            filename,
            location,
            status,
            result,
            created_at,
            updated_at,
        } = parts;
        if result.is_some() != (status == DocumentStatus::Completed) {
            return Err(DocumentValidationError::ResultStatusMismatch { status });
        }
        Ok(Self {
            id,
            owner,
            filename,
            location,
            status,
            result,
            created_at,
            updated_at,
        })
    }

    /// Copy with a new status and result, checking the invariant.
    pub fn with_status(
        &self,
        status: DocumentStatus,
        result: Option<ProcessingResult>,
        at: DateTime<Utc>,
    ) -> Result<Self, DocumentValidationError> {
        Self::from_parts(DocumentParts {
            status,
            result,
            updated_at: at,
            ..self.to_parts()
        })
    }

    /// Decompose into raw parts for persistence.
    pub fn to_parts(&self) -> DocumentParts {
        DocumentParts {
            id: self.id,
            owner: self.owner.clone(),
            filename: self.filename.clone(),
            location: self.location.clone(),
            status: self.status,
            result: self.result.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Document identifier.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Owning account.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Client-supplied filename.
    pub fn filename(&self) -> &DocumentFilename {
        &self.filename
    }

    /// Where the upload bytes are stored.
    pub fn location(&self) -> &StoredFileLocation {
        &self.location
    }

    /// Current lifecycle status.
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Present only when the status is [`DocumentStatus::Completed`].
    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `account` owns this document.
    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        &self.owner == account
    }
}
