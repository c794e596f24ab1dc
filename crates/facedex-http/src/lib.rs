//! facedex-http — Remote sync client for the recognition service's JSON API.

use async_trait::async_trait;
use facedex_core::remote::{
    AssignResponse, ImageUpload, MessageResponse, PersonsResponse, RemoteError, RemoteStore,
    UploadResponse,
};
use facedex_core::Collections;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const USER_AGENT: &str = concat!("facedex/", env!("CARGO_PKG_VERSION"));

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP implementation of [`RemoteStore`].
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        decode(response).await
    }

    /// POST without a body; the reply is checked for status only.
    async fn post_empty(&self, path: &str) -> Result<(), RemoteError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    let response = check_status(response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| RemoteError::Network(e.to_string()))?;
    parse(&bytes)
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RemoteError> {
    serde_json::from_slice(bytes).map_err(|e| RemoteError::Parse(e.to_string()))
}

/// Prefer the service's `{"error": ...}` text; fall back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch_history(&self) -> Result<Collections, RemoteError> {
        self.get_json("history").await
    }

    async fn push_history(&self, collections: &Collections) -> Result<(), RemoteError> {
        let _: MessageResponse = self.post_json("history", collections).await?;
        Ok(())
    }

    async fn fetch_persons(&self) -> Result<Vec<String>, RemoteError> {
        let response: PersonsResponse = self.get_json("persons").await?;
        Ok(response.persons)
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<UploadResponse, RemoteError> {
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let url = self.url("upload");
        tracing::debug!(%url, bytes = upload.bytes.len(), "POST multipart");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        decode(response).await
    }

    async fn create_person(&self, face_id: &str, name: &str) -> Result<AssignResponse, RemoteError> {
        self.post_json("person/create", &json!({ "faceId": face_id, "name": name }))
            .await
    }

    async fn add_to_person(
        &self,
        face_id: &str,
        person_name: &str,
    ) -> Result<AssignResponse, RemoteError> {
        self.post_json(
            "person/add",
            &json!({ "faceId": face_id, "personName": person_name }),
        )
        .await
    }

    async fn delete_face_from_person(
        &self,
        person_name: &str,
        face_id: &str,
    ) -> Result<String, RemoteError> {
        let response: MessageResponse = self
            .post_json(
                "face/delete-from-person",
                &json!({ "personName": person_name, "faceId": face_id }),
            )
            .await?;
        Ok(response.message)
    }

    async fn delete_person(&self, person_name: &str) -> Result<String, RemoteError> {
        let response: MessageResponse = self
            .post_json("person/delete", &json!({ "personName": person_name }))
            .await?;
        Ok(response.message)
    }

    async fn delete_unrecognized_face(&self, face_id: &str) -> Result<String, RemoteError> {
        let response: MessageResponse = self
            .post_json("face/delete", &json!({ "faceId": face_id }))
            .await?;
        Ok(response.message)
    }

    async fn delete_all_history(&self) -> Result<(), RemoteError> {
        self.post_empty("history/delete-all").await
    }

    async fn delete_all_persons(&self) -> Result<(), RemoteError> {
        self.post_empty("persons/delete-all").await
    }

    async fn delete_all_faces(&self) -> Result<(), RemoteError> {
        self.post_empty("faces/delete-all").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(base: &str) -> HttpRemote {
        HttpRemote::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let r = remote("http://localhost:5000/api/");
        assert_eq!(r.url("history"), "http://localhost:5000/api/history");
        assert_eq!(r.url("/person/create"), "http://localhost:5000/api/person/create");
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Face ID not found in unrecognized faces"}"#),
            "Face ID not found in unrecognized faces"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "no details");
    }

    #[test]
    fn test_parse_history_document() {
        let body = br#"{
            "type": "history",
            "image_history": [{"id": 1700000000000, "image": "data:image/png;base64,AA==",
                               "timestamp": "t", "results": []}],
            "recognized_persons": [],
            "unrecognized_persons": []
        }"#;
        let collections: Collections = parse(body).unwrap();
        assert_eq!(collections.history.len(), 1);
        assert_eq!(collections.history[0].id, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_failure_is_parse_error() {
        let err = parse::<Collections>(b"<html>").unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on loopback is not expected to serve HTTP.
        let r = HttpRemote::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let err = r.fetch_persons().await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }
}
