use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, StudentId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassError {
    #[error("class name cannot be empty")]
    EmptyName,
}

//
// ─── CLASS ─────────────────────────────────────────────────────────────────────
//

/// A class (turma) that owns an ordered roster of students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    id: ClassId,
    name: String,
    grade: String,
    year: i32,
    created_at: DateTime<Utc>,
}

impl Class {
    /// # Errors
    ///
    /// Returns `ClassError::EmptyName` if the name is blank.
    pub fn new(
        id: ClassId,
        name: impl Into<String>,
        grade: impl Into<String>,
        year: i32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ClassError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ClassError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            grade: grade.into().trim().to_owned(),
            year,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn grade(&self) -> &str {
        &self.grade
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

/// Fields needed to build a `Student`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub class_id: ClassId,
    pub name: String,
    pub email: String,
    pub nickname: Option<String>,
    pub photo_url: Option<String>,
    pub photo_consent: bool,
}

impl StudentDraft {
    #[must_use]
    pub fn new(class_id: ClassId, name: impl Into<String>) -> Self {
        Self {
            class_id,
            name: name.into(),
            email: String::new(),
            nickname: None,
            photo_url: None,
            photo_consent: false,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn with_photo(mut self, url: impl Into<String>, consent: bool) -> Self {
        self.photo_url = Some(url.into());
        self.photo_consent = consent;
        self
    }

    /// Validate the draft and assign an identity.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` if the name is blank.
    pub fn validate(self, id: StudentId, created_at: DateTime<Utc>) -> Result<Student, StudentError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        let nickname = self
            .nickname
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        Ok(Student {
            id,
            class_id: self.class_id,
            name,
            email: self.email.trim().to_owned(),
            nickname,
            photo_url: self.photo_url,
            photo_consent: self.photo_consent,
            created_at,
        })
    }
}

/// A student on a class roster.
///
/// Immutable once created except through an explicit edit (re-validating a draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    class_id: ClassId,
    name: String,
    email: String,
    nickname: Option<String>,
    photo_url: Option<String>,
    photo_consent: bool,
    created_at: DateTime<Utc>,
}

impl Student {
    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Raw stored photo URL, regardless of consent.
    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    #[must_use]
    pub fn photo_consent(&self) -> bool {
        self.photo_consent
    }

    /// Photo that may be shown to evaluators. `None` without consent.
    #[must_use]
    pub fn display_photo(&self) -> Option<&str> {
        if self.photo_consent {
            self.photo_url.as_deref()
        } else {
            None
        }
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns an editable draft carrying the current values.
    #[must_use]
    pub fn to_draft(&self) -> StudentDraft {
        StudentDraft {
            class_id: self.class_id,
            name: self.name.clone(),
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            photo_url: self.photo_url.clone(),
            photo_consent: self.photo_consent,
        }
    }
}
