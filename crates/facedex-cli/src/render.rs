//! Plain-text listings of the collections.

use facedex_core::{Assignment, Collections, Face, HistoryItem, Person, RecognitionResult};
use std::fmt::Write;

pub fn results(results: &[RecognitionResult]) -> String {
    let mut out = String::new();
    for r in results {
        let _ = write!(out, "  {}  {} ({:.0}%)", r.id, r.name, r.confidence);
        if let Some(pos) = r.face_position {
            let _ = write!(
                out,
                "  at {},{} {}x{}",
                pos.left(),
                pos.top(),
                pos.width(),
                pos.height()
            );
        }
        out.push('\n');
    }
    out
}

pub fn history(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No upload history\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let n = item.results.len();
        let plural = if n == 1 { "" } else { "s" };
        let _ = writeln!(out, "{}  {}  {n} face{plural} detected", item.id, item.timestamp);
    }
    out
}

pub fn persons(persons: &[Person], known: &[String]) -> String {
    let mut out = String::new();
    if persons.is_empty() {
        out.push_str("No recognized persons\n");
    }
    for person in persons {
        let _ = writeln!(out, "{} ({} faces)", person.name, person.images.len());
        for face in &person.images {
            let _ = writeln!(
                out,
                "  {}  {:.0}%  {}",
                face.id, face.confidence, face.timestamp
            );
        }
    }
    if !known.is_empty() {
        let _ = writeln!(out, "Known to service: {}", known.join(", "));
    }
    out
}

pub fn unrecognized(faces: &[Face]) -> String {
    if faces.is_empty() {
        return "No unrecognized faces\n".to_string();
    }
    let mut out = String::new();
    for face in faces {
        let _ = writeln!(out, "{}  {}", face.id, face.timestamp);
    }
    out
}

pub fn assignment(outcome: Assignment, person: &str) -> String {
    match outcome {
        Assignment::Assigned => format!("Added face to person: {person}"),
        Assignment::Duplicate => {
            format!("This face already exists for {person} and was not added again.")
        }
    }
}

pub fn summary(collections: &Collections) -> String {
    format!(
        "{} uploads, {} persons, {} unrecognized faces",
        collections.history.len(),
        collections.persons.len(),
        collections.unrecognized.len()
    )
}
