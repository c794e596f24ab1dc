//! Remote sync boundary: the recognition service and its authoritative store.

use crate::types::{Collections, RecognitionResult};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Parse(String),
}

/// An image to send for recognition.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<RecognitionResult>,
}

/// Reply to a create-person or add-to-person call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignResponse {
    #[serde(default)]
    pub message: String,
    /// The server already had this capture bound to the person.
    #[serde(default)]
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonsResponse {
    #[serde(default)]
    pub persons: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Calls the engine makes against the remote service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the mirrored history document.
    async fn fetch_history(&self) -> Result<Collections, RemoteError>;

    /// Overwrite the mirrored history document.
    async fn push_history(&self, collections: &Collections) -> Result<(), RemoteError>;

    /// Names of every person the service knows.
    async fn fetch_persons(&self) -> Result<Vec<String>, RemoteError>;

    async fn upload_image(&self, upload: &ImageUpload) -> Result<UploadResponse, RemoteError>;

    async fn create_person(&self, face_id: &str, name: &str) -> Result<AssignResponse, RemoteError>;

    async fn add_to_person(
        &self,
        face_id: &str,
        person_name: &str,
    ) -> Result<AssignResponse, RemoteError>;

    async fn delete_face_from_person(
        &self,
        person_name: &str,
        face_id: &str,
    ) -> Result<String, RemoteError>;

    async fn delete_person(&self, person_name: &str) -> Result<String, RemoteError>;

    /// Discard a face that was never assigned to anyone.
    async fn delete_unrecognized_face(&self, face_id: &str) -> Result<String, RemoteError>;

    async fn delete_all_history(&self) -> Result<(), RemoteError>;

    async fn delete_all_persons(&self) -> Result<(), RemoteError>;

    async fn delete_all_faces(&self) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_decoding() {
        let json = r#"{
            "message": "Processed 2 faces",
            "results": [
                {"id": "1", "name": "Alice", "confidence": 90, "face_image": "f1", "face_position": [1, 2, 3, 4]},
                {"id": "2", "name": "Person not found", "confidence": 0, "face_image": "f2"}
            ]
        }"#;
        let response: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.message.as_deref(), Some("Processed 2 faces"));
        assert_eq!(response.results.len(), 2);
        assert!(response.results[0].is_resolved());
        assert!(!response.results[1].is_resolved());
        assert!(response.results[1].face_position.is_none());
    }

    #[test]
    fn test_assign_response_without_duplicate_flag() {
        // Older servers omit the flag; absence means a fresh binding.
        let response: AssignResponse =
            serde_json::from_str(r#"{"message": "Added face to person: Bob", "person": "Bob"}"#)
                .unwrap();
        assert!(!response.is_duplicate);
    }

    #[test]
    fn test_persons_response_ignores_extra_fields() {
        let response: PersonsResponse =
            serde_json::from_str(r#"{"persons": ["Alice", "Bob"], "unrecognized": ["x"]}"#).unwrap();
        assert_eq!(response.persons, ["Alice", "Bob"]);
    }
}
