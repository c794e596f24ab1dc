//! In-memory stand-ins for the remote service and the confirmation prompt.

use crate::confirm::Confirm;
use crate::remote::{AssignResponse, ImageUpload, RemoteError, RemoteStore, UploadResponse};
use crate::types::Collections;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    history: Collections,
    persons: Vec<String>,
    upload: UploadResponse,
    duplicate: bool,
    calls: Vec<String>,
    pushes: Vec<Collections>,
}

/// Records every call. With `fail` set, every call returns a network error.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
    fail: bool,
}

impl FakeRemote {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_history(self, history: Collections) -> Self {
        self.state.lock().unwrap().history = history;
        self
    }

    pub fn with_persons(self, persons: &[&str]) -> Self {
        self.state.lock().unwrap().persons = persons.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_upload(self, upload: UploadResponse) -> Self {
        self.state.lock().unwrap().upload = upload;
        self
    }

    pub fn with_duplicate(self, duplicate: bool) -> Self {
        self.state.lock().unwrap().duplicate = duplicate;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn pushes(&self) -> Vec<Collections> {
        self.state.lock().unwrap().pushes.clone()
    }

    fn record(&self, call: &str) -> Result<(), RemoteError> {
        self.state.lock().unwrap().calls.push(call.to_string());
        if self.fail {
            Err(RemoteError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn assign(&self, call: &str, name: &str) -> Result<AssignResponse, RemoteError> {
        self.record(call)?;
        let mut state = self.state.lock().unwrap();
        if !state.persons.iter().any(|p| p == name) {
            state.persons.push(name.to_string());
        }
        Ok(AssignResponse {
            message: format!("Added face to person: {name}"),
            is_duplicate: state.duplicate,
        })
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_history(&self) -> Result<Collections, RemoteError> {
        self.record("fetch_history")?;
        Ok(self.state.lock().unwrap().history.clone())
    }

    async fn push_history(&self, collections: &Collections) -> Result<(), RemoteError> {
        self.record("push_history")?;
        self.state.lock().unwrap().pushes.push(collections.clone());
        Ok(())
    }

    async fn fetch_persons(&self) -> Result<Vec<String>, RemoteError> {
        self.record("fetch_persons")?;
        Ok(self.state.lock().unwrap().persons.clone())
    }

    async fn upload_image(&self, _upload: &ImageUpload) -> Result<UploadResponse, RemoteError> {
        self.record("upload_image")?;
        Ok(self.state.lock().unwrap().upload.clone())
    }

    async fn create_person(&self, _face_id: &str, name: &str) -> Result<AssignResponse, RemoteError> {
        self.assign("create_person", name)
    }

    async fn add_to_person(
        &self,
        _face_id: &str,
        person_name: &str,
    ) -> Result<AssignResponse, RemoteError> {
        self.assign("add_to_person", person_name)
    }

    async fn delete_face_from_person(
        &self,
        person_name: &str,
        _face_id: &str,
    ) -> Result<String, RemoteError> {
        self.record("delete_face_from_person")?;
        Ok(format!("Successfully deleted face from person: {person_name}"))
    }

    async fn delete_person(&self, person_name: &str) -> Result<String, RemoteError> {
        self.record("delete_person")?;
        self.state.lock().unwrap().persons.retain(|p| p != person_name);
        Ok(format!("Successfully deleted person: {person_name}"))
    }

    async fn delete_unrecognized_face(&self, face_id: &str) -> Result<String, RemoteError> {
        self.record("delete_unrecognized_face")?;
        Ok(format!("Successfully deleted face: {face_id}"))
    }

    async fn delete_all_history(&self) -> Result<(), RemoteError> {
        self.record("delete_all_history")
    }

    async fn delete_all_persons(&self) -> Result<(), RemoteError> {
        self.record("delete_all_persons")?;
        self.state.lock().unwrap().persons.clear();
        Ok(())
    }

    async fn delete_all_faces(&self) -> Result<(), RemoteError> {
        self.record("delete_all_faces")
    }
}

/// Answers every prompt the same way and counts how often it was asked.
pub struct FakeConfirm {
    answer: bool,
    asked: AtomicUsize,
}

impl FakeConfirm {
    pub fn yes() -> Self {
        Self {
            answer: true,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn no() -> Self {
        Self {
            answer: false,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Confirm for FakeConfirm {
    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
