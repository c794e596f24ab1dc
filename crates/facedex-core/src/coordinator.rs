//! User actions: remote call first, canonical mutation second.
//!
//! Identity-changing actions (create, assign, delete) only touch the
//! collections after the remote service confirms them. Single history item
//! deletion is the one optimistic action: it mutates at once and relies on
//! the mirror push. Concurrent actions are not serialized; each applies its
//! own mutation when its response arrives.

use crate::confirm::Confirm;
use crate::engine::{Assignment, SharedReconciler};
use crate::lifecycle::refresh_persons;
use crate::remote::{ImageUpload, RemoteError, RemoteStore};
use crate::types::{Face, ImageRef, RecognitionResult};
use image::ImageFormat;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("face {0} is not in the unrecognized queue")]
    FaceNotQueued(String),
    #[error("person name must not be empty")]
    EmptyName,
    #[error("unknown person: {0}")]
    UnknownPerson(String),
    #[error("not a JPEG or PNG image")]
    InvalidImage,
    #[error("no faces detected in the image")]
    NoFaces,
}

/// Result of an action that asks the user first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Cancelled,
}

/// What an upload produced.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub message: Option<String>,
    pub history_id: i64,
    pub results: Vec<RecognitionResult>,
}

pub struct Coordinator {
    engine: SharedReconciler,
    remote: Arc<dyn RemoteStore>,
    confirm: Arc<dyn Confirm>,
}

impl Coordinator {
    pub fn new(
        engine: SharedReconciler,
        remote: Arc<dyn RemoteStore>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            engine,
            remote,
            confirm,
        }
    }

    /// Send a photo for recognition and merge what comes back.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReport, MutationError> {
        let mime = match image::guess_format(&bytes) {
            Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format.to_mime_type(),
            _ => return Err(MutationError::InvalidImage),
        };

        let upload = ImageUpload {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes,
        };
        let response = self.remote.upload_image(&upload).await.map_err(|e| {
            tracing::warn!(file = file_name, error = %e, "upload failed");
            e
        })?;

        if response.results.is_empty() {
            return Err(MutationError::NoFaces);
        }

        let image = ImageRef::from_bytes(&upload.mime, &upload.bytes);
        let history_id = self
            .engine
            .lock()
            .await
            .apply_recognition_result(image, response.results.clone());

        self.refresh_persons().await;

        Ok(UploadReport {
            message: response.message,
            history_id,
            results: response.results,
        })
    }

    /// Bind a queued face to a new person (or an existing one with that name).
    pub async fn create_person(
        &self,
        face_id: &str,
        name: &str,
    ) -> Result<Assignment, MutationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MutationError::EmptyName);
        }
        let face = self.queued_face(face_id).await?;

        let response = self
            .remote
            .create_person(face_id, name)
            .await
            .map_err(|e| {
                tracing::warn!(face_id, person = %name, error = %e, "create person failed");
                e
            })?;

        let outcome = self
            .engine
            .lock()
            .await
            .accept_assignment(face, name, response.is_duplicate);
        self.refresh_persons().await;
        Ok(outcome)
    }

    /// Bind a queued face to a person the remote service already knows.
    pub async fn add_face_to_person(
        &self,
        face_id: &str,
        person_name: &str,
    ) -> Result<Assignment, MutationError> {
        if !self.engine.lock().await.knows_person(person_name) {
            return Err(MutationError::UnknownPerson(person_name.to_string()));
        }
        let face = self.queued_face(face_id).await?;

        let response = self
            .remote
            .add_to_person(face_id, person_name)
            .await
            .map_err(|e| {
                tracing::warn!(face_id, person = %person_name, error = %e, "add to person failed");
                e
            })?;

        let outcome = self
            .engine
            .lock()
            .await
            .accept_assignment(face, person_name, response.is_duplicate);
        self.refresh_persons().await;
        Ok(outcome)
    }

    pub async fn delete_face(
        &self,
        person_name: &str,
        face_id: &str,
    ) -> Result<Outcome, MutationError> {
        let body = format!("Delete this face from {person_name}?");
        if !self.confirm.confirm("Delete face?", &body).await {
            return Ok(Outcome::Cancelled);
        }

        let message = self
            .remote
            .delete_face_from_person(person_name, face_id)
            .await
            .map_err(|e| {
                tracing::warn!(face_id, person = %person_name, error = %e, "delete face failed");
                e
            })?;
        tracing::info!(%message, "face deleted");

        self.engine.lock().await.remove_face(person_name, face_id);
        self.refresh_persons().await;
        Ok(Outcome::Done)
    }

    pub async fn delete_person(&self, person_name: &str) -> Result<Outcome, MutationError> {
        let body = format!("Delete {person_name} and all their face images?");
        if !self.confirm.confirm("Delete person?", &body).await {
            return Ok(Outcome::Cancelled);
        }

        let message = self.remote.delete_person(person_name).await.map_err(|e| {
            tracing::warn!(person = %person_name, error = %e, "delete person failed");
            e
        })?;
        tracing::info!(%message, "person deleted");

        self.engine.lock().await.remove_person(person_name);
        self.refresh_persons().await;
        Ok(Outcome::Done)
    }

    /// Discard a queued face without assigning it.
    pub async fn delete_unrecognized_face(&self, face_id: &str) -> Result<Outcome, MutationError> {
        if !self
            .confirm
            .confirm("Discard face?", "Remove this unrecognized face?")
            .await
        {
            return Ok(Outcome::Cancelled);
        }

        self.remote
            .delete_unrecognized_face(face_id)
            .await
            .map_err(|e| {
                tracing::warn!(face_id, error = %e, "discard face failed");
                e
            })?;

        self.engine.lock().await.remove_unrecognized(face_id);
        Ok(Outcome::Done)
    }

    /// Optimistic: removed locally at once, the mirror push carries it upstream.
    pub async fn delete_history_item(&self, id: i64) -> Outcome {
        if !self
            .confirm
            .confirm("Are you sure?", "You won't be able to revert this!")
            .await
        {
            return Outcome::Cancelled;
        }
        if !self.engine.lock().await.remove_history_item(id) {
            tracing::debug!(id, "history item already gone");
        }
        Outcome::Done
    }

    pub async fn clear_all_history(&self) -> Result<Outcome, MutationError> {
        if !self
            .confirm
            .confirm("Delete all history?", "You won't be able to revert this!")
            .await
        {
            return Ok(Outcome::Cancelled);
        }
        self.remote.delete_all_history().await.map_err(|e| {
            tracing::warn!(error = %e, "delete all history failed");
            e
        })?;
        self.engine.lock().await.clear_history();
        Ok(Outcome::Done)
    }

    pub async fn clear_all_persons(&self) -> Result<Outcome, MutationError> {
        if !self
            .confirm
            .confirm(
                "Delete all recognized persons?",
                "You won't be able to revert this!",
            )
            .await
        {
            return Ok(Outcome::Cancelled);
        }
        self.remote.delete_all_persons().await.map_err(|e| {
            tracing::warn!(error = %e, "delete all persons failed");
            e
        })?;
        self.engine.lock().await.clear_persons();
        self.refresh_persons().await;
        Ok(Outcome::Done)
    }

    pub async fn clear_all_unrecognized(&self) -> Result<Outcome, MutationError> {
        if !self
            .confirm
            .confirm(
                "Delete all unrecognized faces?",
                "You won't be able to revert this!",
            )
            .await
        {
            return Ok(Outcome::Cancelled);
        }
        self.remote.delete_all_faces().await.map_err(|e| {
            tracing::warn!(error = %e, "delete all faces failed");
            e
        })?;
        self.engine.lock().await.clear_unrecognized();
        Ok(Outcome::Done)
    }

    async fn queued_face(&self, face_id: &str) -> Result<Face, MutationError> {
        self.engine
            .lock()
            .await
            .queued_face(face_id)
            .cloned()
            .ok_or_else(|| MutationError::FaceNotQueued(face_id.to_string()))
    }

    async fn refresh_persons(&self) {
        refresh_persons(&self.engine, self.remote.as_ref()).await;
    }
}
