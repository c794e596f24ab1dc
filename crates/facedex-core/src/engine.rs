//! The reconciliation engine: sole owner and writer of the canonical collections.
//!
//! Every mutation keeps these invariants:
//! - history holds at most [`HISTORY_LIMIT`] items, newest first;
//! - each person's images are unique by image reference, at most
//!   [`PERSON_IMAGE_LIMIT`], newest first, and never empty;
//! - the unrecognized queue is unique by image reference and holds at most
//!   [`UNRECOGNIZED_LIMIT`] faces, newest first.
//!
//! Committed mutations are copied to every registered [`Mirror`] once the
//! engine reaches [`Phase::Ready`].

use crate::dedup::{contains_image, dedupe_by_image};
use crate::eviction::{
    cap_list, prepend_capped, HISTORY_LIMIT, PERSON_IMAGE_LIMIT, UNRECOGNIZED_LIMIT,
};
use crate::mirror::Mirror;
use crate::types::{
    display_timestamp, Collections, Face, HistoryItem, ImageRef, Person, RecognitionResult,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Confidence recorded for faces a user assigned by hand.
pub const MANUAL_CONFIDENCE: f32 = 100.0;

/// Handle shared by the lifecycle controller and the mutation coordinator.
pub type SharedReconciler = Arc<Mutex<Reconciler>>;

/// Load progress. Mirror writes are suppressed until `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    LoadingLocal,
    LoadingRemote,
    Ready,
}

/// What an accepted assignment did to the person collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The face joined the person's gallery.
    Assigned,
    /// The capture was already bound; galleries are unchanged.
    Duplicate,
}

pub struct Reconciler {
    collections: Collections,
    all_persons: Vec<String>,
    phase: Phase,
    mirrors: Vec<Box<dyn Mirror>>,
    last_history_id: i64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            collections: Collections::default(),
            all_persons: Vec::new(),
            phase: Phase::Uninitialized,
            mirrors: Vec::new(),
            last_history_id: 0,
        }
    }

    pub fn with_mirror(mut self, mirror: impl Mirror + 'static) -> Self {
        self.mirrors.push(Box::new(mirror));
        self
    }

    pub fn into_shared(self) -> SharedReconciler {
        Arc::new(Mutex::new(self))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.collections.history
    }

    pub fn persons(&self) -> &[Person] {
        &self.collections.persons
    }

    pub fn person(&self, name: &str) -> Option<&Person> {
        self.collections.persons.iter().find(|p| p.name == name)
    }

    pub fn unrecognized(&self) -> &[Face] {
        &self.collections.unrecognized
    }

    pub fn queued_face(&self, face_id: &str) -> Option<&Face> {
        self.collections.unrecognized.iter().find(|f| f.id == face_id)
    }

    /// Every person name known to the remote service.
    pub fn all_persons(&self) -> &[String] {
        &self.all_persons
    }

    pub fn knows_person(&self, name: &str) -> bool {
        self.all_persons.iter().any(|n| n == name)
    }

    /// Advance the load state. Entering `Ready` mirrors the loaded state once.
    pub(crate) fn set_phase(&mut self, phase: Phase) {
        let was_ready = self.phase == Phase::Ready;
        tracing::debug!(from = ?self.phase, to = ?phase, "engine phase");
        self.phase = phase;
        if phase == Phase::Ready && !was_ready {
            self.commit();
        }
    }

    /// Merge one upload's recognition results. Returns the new history item's id.
    pub fn apply_recognition_result(
        &mut self,
        uploaded_image: ImageRef,
        results: Vec<RecognitionResult>,
    ) -> i64 {
        let timestamp = display_timestamp();
        let id = self.next_history_id();

        let mut staged = Vec::new();
        for result in &results {
            let face = result.to_face(&timestamp);
            if result.is_resolved() {
                let added = self.merge_into_person(&result.name, face);
                if !added {
                    tracing::debug!(
                        person = %result.name,
                        image = %result.face_image.fingerprint(),
                        "duplicate capture ignored"
                    );
                }
            } else {
                staged.push(face);
            }
        }

        let staged_count = staged.len();
        staged.extend(std::mem::take(&mut self.collections.unrecognized));
        self.collections.unrecognized = cap_list(dedupe_by_image(staged), UNRECOGNIZED_LIMIT);

        tracing::info!(
            history_id = id,
            results = results.len(),
            unrecognized = staged_count,
            "recognition result applied"
        );

        prepend_capped(
            &mut self.collections.history,
            HistoryItem {
                id,
                image: uploaded_image,
                timestamp,
                results,
            },
            HISTORY_LIMIT,
        );

        self.commit();
        id
    }

    /// Apply a remote-confirmed assignment of a queued face to `name`.
    ///
    /// The face leaves the unrecognized queue either way. Unless the server
    /// reported a duplicate binding, it is added to the person's gallery at
    /// full confidence, creating the person if needed.
    pub fn accept_assignment(&mut self, face: Face, name: &str, duplicate: bool) -> Assignment {
        self.collections.unrecognized.retain(|f| f.id != face.id);

        let outcome = if duplicate {
            Assignment::Duplicate
        } else {
            let face = Face {
                confidence: MANUAL_CONFIDENCE,
                timestamp: display_timestamp(),
                face_position: None,
                ..face
            };
            if self.merge_into_person(name, face) {
                Assignment::Assigned
            } else {
                Assignment::Duplicate
            }
        };

        tracing::info!(person = %name, ?outcome, "assignment accepted");
        self.commit();
        outcome
    }

    /// Remove one face from a person's gallery; an emptied person is removed too.
    pub fn remove_face(&mut self, person_name: &str, face_id: &str) -> bool {
        let persons = &mut self.collections.persons;
        let Some(idx) = persons.iter().position(|p| p.name == person_name) else {
            return false;
        };

        let before = persons[idx].images.len();
        persons[idx].images.retain(|f| f.id != face_id);
        let removed = persons[idx].images.len() != before;

        if persons[idx].images.is_empty() {
            persons.remove(idx);
            tracing::info!(person = %person_name, "last face removed; person dropped");
        }

        if removed {
            self.commit();
        }
        removed
    }

    pub fn remove_person(&mut self, name: &str) -> bool {
        let before = self.collections.persons.len();
        self.collections.persons.retain(|p| p.name != name);
        let removed = self.collections.persons.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    pub fn remove_unrecognized(&mut self, face_id: &str) -> Option<Face> {
        let idx = self
            .collections
            .unrecognized
            .iter()
            .position(|f| f.id == face_id)?;
        let face = self.collections.unrecognized.remove(idx);
        self.commit();
        Some(face)
    }

    pub fn remove_history_item(&mut self, id: i64) -> bool {
        let before = self.collections.history.len();
        self.collections.history.retain(|h| h.id != id);
        let removed = self.collections.history.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    pub fn clear_history(&mut self) {
        self.collections.history.clear();
        self.commit();
    }

    pub fn clear_persons(&mut self) {
        self.collections.persons.clear();
        self.commit();
    }

    pub fn clear_unrecognized(&mut self) {
        self.collections.unrecognized.clear();
        self.commit();
    }

    /// Replace all collections with a locally cached copy.
    pub fn restore(&mut self, cached: Collections) {
        self.collections = sanitize(cached);
        self.note_history_ids();
        self.commit();
    }

    /// Take each collection from the remote copy when that collection is
    /// non-empty there. An empty remote collection never clears local data.
    pub fn merge_remote(&mut self, remote: Collections) -> bool {
        let remote = sanitize(remote);
        let mut changed = false;

        if !remote.history.is_empty() && remote.history != self.collections.history {
            self.collections.history = remote.history;
            changed = true;
        }
        if !remote.persons.is_empty() && remote.persons != self.collections.persons {
            self.collections.persons = remote.persons;
            changed = true;
        }
        if !remote.unrecognized.is_empty() && remote.unrecognized != self.collections.unrecognized
        {
            self.collections.unrecognized = remote.unrecognized;
            changed = true;
        }

        if changed {
            self.note_history_ids();
            self.commit();
        }
        changed
    }

    pub fn set_all_persons(&mut self, names: Vec<String>) {
        self.all_persons = names;
    }

    /// Teardown flush: synchronous mirrors only.
    pub fn flush(&self) {
        for mirror in &self.mirrors {
            mirror.flush(&self.collections);
        }
    }

    fn commit(&self) {
        if self.phase != Phase::Ready {
            return;
        }
        for mirror in &self.mirrors {
            tracing::trace!(mirror = mirror.name(), "mirroring");
            mirror.mirror(&self.collections);
        }
    }

    /// Returns false when the person already holds this capture.
    fn merge_into_person(&mut self, name: &str, face: Face) -> bool {
        match self.collections.persons.iter_mut().find(|p| p.name == name) {
            None => {
                self.collections.persons.push(Person {
                    name: name.to_string(),
                    images: vec![face],
                });
                true
            }
            Some(person) if contains_image(&person.images, &face.image) => false,
            Some(person) => {
                prepend_capped(&mut person.images, face, PERSON_IMAGE_LIMIT);
                true
            }
        }
    }

    fn next_history_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let id = if now > self.last_history_id {
            now
        } else {
            self.last_history_id + 1
        };
        self.last_history_id = id;
        id
    }

    fn note_history_ids(&mut self) {
        if let Some(max) = self.collections.history.iter().map(|h| h.id).max() {
            self.last_history_id = self.last_history_id.max(max);
        }
    }
}

/// Enforce every collection invariant on data that did not come from the engine.
fn sanitize(mut collections: Collections) -> Collections {
    let mut ids = HashSet::new();
    collections.history.retain(|item| ids.insert(item.id));
    collections.history = cap_list(collections.history, HISTORY_LIMIT);

    let mut persons: Vec<Person> = Vec::with_capacity(collections.persons.len());
    for person in collections.persons {
        match persons.iter_mut().find(|p| p.name == person.name) {
            Some(existing) => existing.images.extend(person.images),
            None => persons.push(person),
        }
    }
    for person in &mut persons {
        let images = std::mem::take(&mut person.images);
        person.images = cap_list(dedupe_by_image(images), PERSON_IMAGE_LIMIT);
    }
    persons.retain(|p| !p.images.is_empty());
    collections.persons = persons;

    collections.unrecognized = cap_list(
        dedupe_by_image(collections.unrecognized),
        UNRECOGNIZED_LIMIT,
    );
    collections
}
