use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Name the recognition service reports for a face it could not match.
pub const UNRESOLVED_NAME: &str = "Person not found";

/// Reference to image data, usually a base64 payload or a data URL.
///
/// Two captures are the same face capture exactly when their references are
/// byte-identical; this is the identity key used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Build a `data:` URL reference from raw image bytes.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{mime};base64,{payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 prefix, suitable for log fields.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        digest[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Face location inside the uploaded image, as `[top, right, bottom, left]` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacePosition(pub i32, pub i32, pub i32, pub i32);

impl FacePosition {
    pub fn top(&self) -> i32 {
        self.0
    }

    pub fn left(&self) -> i32 {
        self.3
    }

    pub fn width(&self) -> i32 {
        self.1 - self.3
    }

    pub fn height(&self) -> i32 {
        self.2 - self.0
    }
}

/// A single face capture, either in a person's gallery or in the unrecognized queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    /// Assigned by the recognition service; stable once assigned.
    pub id: String,
    pub image: ImageRef,
    /// Match confidence in [0, 100]. Unrecognized faces carry 0.
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_position: Option<FacePosition>,
}

/// One face as reported by the recognition service for an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub confidence: f32,
    pub face_image: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_position: Option<FacePosition>,
}

impl RecognitionResult {
    /// Whether the service matched this face to a known person.
    pub fn is_resolved(&self) -> bool {
        self.name != UNRESOLVED_NAME && self.confidence > 0.0
    }

    pub fn to_face(&self, timestamp: &str) -> Face {
        Face {
            id: self.id.clone(),
            image: self.face_image.clone(),
            confidence: self.confidence,
            timestamp: timestamp.to_string(),
            face_position: self.face_position,
        }
    }
}

/// One uploaded photo and what the service found in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Creation time in Unix milliseconds, unique within the history.
    pub id: i64,
    /// The full uploaded image, not a face crop.
    pub image: ImageRef,
    pub timestamp: String,
    #[serde(default)]
    pub results: Vec<RecognitionResult>,
}

/// A named gallery of face captures, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Face>,
}

/// The three canonical collections.
///
/// Serialized field names match the remote history document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(rename = "image_history", default)]
    pub history: Vec<HistoryItem>,
    #[serde(rename = "recognized_persons", default)]
    pub persons: Vec<Person>,
    #[serde(rename = "unrecognized_persons", default)]
    pub unrecognized: Vec<Face>,
}

impl Collections {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.persons.is_empty() && self.unrecognized.is_empty()
    }
}

/// Local wall-clock timestamp in the format shown to users.
pub fn display_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
