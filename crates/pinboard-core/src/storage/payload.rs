//! Persisted and exported JSON payloads.
//!
//! Stored data is validated structurally before it is trusted: anything that
//! is not shaped like a board is rejected as a whole.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::board::BoardSnapshot;
use crate::folder::Folder;
use crate::note::Note;

/// Version tag written into exported documents.
pub const EXPORT_VERSION: &str = "1.0";

/// Why an exported or stored document was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Document is not a JSON object")]
    NotAnObject,
    #[error("\"notes\" is not an array")]
    NotesNotArray,
    #[error("\"folders\" is not an array")]
    FoldersNotArray,
    #[error("Invalid note at index {index}: {reason}")]
    InvalidNote { index: usize, reason: String },
    #[error("Invalid folder at index {index}: {reason}")]
    InvalidFolder { index: usize, reason: String },
    #[error("\"nextZIndex\" is not a non-negative number")]
    InvalidNextZIndex,
}

/// Notes as persisted under the notes key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNotesPayload {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_z_index: Option<u64>,
}

/// Full-board export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub next_z_index: u64,
    /// ISO-8601 timestamp.
    pub exported_at: String,
    pub version: String,
}

impl ExportPayload {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            notes: snapshot.notes.clone(),
            folders: snapshot.folders.clone(),
            next_z_index: snapshot.next_z_index,
            exported_at: chrono::Utc::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
        }
    }
}

/// True if `value` is an object whose optional `notes` is an array of
/// objects and whose optional `nextZIndex` is a number.
pub fn is_stored_notes_payload(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let notes_valid = match object.get("notes") {
        None => true,
        Some(Value::Array(items)) => items.iter().all(Value::is_object),
        Some(_) => false,
    };
    let z_valid = object.get("nextZIndex").is_none_or(Value::is_number);
    notes_valid && z_valid
}

/// True if `value` is an array.
pub fn is_stored_folders_payload(value: &Value) -> bool {
    value.is_array()
}

fn parse_value(json: &str) -> Result<Value, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::InvalidJson(e.to_string()))
}

fn parse_next_z_index(value: Option<&Value>) -> Result<Option<u64>, ImportError> {
    let Some(value) = value else {
        return Ok(None);
    };
    if let Some(z) = value.as_u64() {
        return Ok(Some(z));
    }
    match value.as_f64() {
        Some(z) if z.is_finite() && z >= 0.0 => Ok(Some(z.floor() as u64)),
        _ => Err(ImportError::InvalidNextZIndex),
    }
}

fn parse_notes(value: Option<&Value>) -> Result<Vec<Note>, ImportError> {
    let items = match value {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ImportError::NotesNotArray),
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(ImportError::InvalidNote {
                    index,
                    reason: "not an object".to_string(),
                });
            }
            Note::deserialize(item).map_err(|e| ImportError::InvalidNote {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn parse_folders(value: &Value) -> Result<Vec<Folder>, ImportError> {
    let Value::Array(items) = value else {
        return Err(ImportError::FoldersNotArray);
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Folder::deserialize(item).map_err(|e| ImportError::InvalidFolder {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ImportError> {
    value.as_object().ok_or(ImportError::NotAnObject)
}

/// Parse the notes payload stored under the notes key.
pub fn parse_stored_notes(json: &str) -> Result<StoredNotesPayload, ImportError> {
    let value = parse_value(json)?;
    let object = as_object(&value)?;
    Ok(StoredNotesPayload {
        notes: parse_notes(object.get("notes"))?,
        next_z_index: parse_next_z_index(object.get("nextZIndex"))?,
    })
}

/// Parse the folders payload stored under the folders key.
pub fn parse_stored_folders(json: &str) -> Result<Vec<Folder>, ImportError> {
    let value = parse_value(json)?;
    if !is_stored_folders_payload(&value) {
        return Err(ImportError::FoldersNotArray);
    }
    parse_folders(&value)
}

/// Clear folder references that point at folders not in `folders`.
/// Returns the number of notes unfiled.
pub fn unfile_orphans(notes: &mut [Note], folders: &[Folder]) -> usize {
    let mut unfiled = 0;
    for note in notes.iter_mut() {
        let orphaned = note
            .folder_id
            .as_deref()
            .is_some_and(|id| !folders.iter().any(|f| f.id == id));
        if orphaned {
            note.folder_id = None;
            unfiled += 1;
        }
    }
    unfiled
}

/// Make z-indexes unique without changing the stacking order.
///
/// Notes are walked back to front; a note tied with (or below) the one
/// beneath it is lifted just above it. Returns the number of notes changed.
pub fn renumber_duplicate_z(notes: &mut [Note]) -> usize {
    let mut order: Vec<usize> = (0..notes.len()).collect();
    order.sort_by_key(|&i| notes[i].z_index);

    let mut renumbered = 0;
    let mut below: Option<u64> = None;
    for i in order {
        if below.is_some_and(|z| notes[i].z_index <= z) {
            notes[i].z_index = below.map_or(1, |z| z + 1);
            renumbered += 1;
        }
        below = Some(notes[i].z_index);
    }
    renumbered
}

/// Serialize a board snapshot as an export document.
pub fn export_board(snapshot: &BoardSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ExportPayload::from_snapshot(snapshot))
}

/// Parse and validate an export document.
///
/// `notes` and `folders` must both be arrays; `nextZIndex` is optional.
/// Notes filed into folders the document does not contain are unfiled.
pub fn import_board(json: &str) -> Result<BoardSnapshot, ImportError> {
    let value = parse_value(json).inspect_err(|e| log::warn!("Rejected import: {e}"))?;
    let snapshot = snapshot_from_value(&value).inspect_err(|e| log::warn!("Rejected import: {e}"))?;
    log::debug!(
        "Imported {} note(s) and {} folder(s)",
        snapshot.notes.len(),
        snapshot.folders.len()
    );
    Ok(snapshot)
}

fn snapshot_from_value(value: &Value) -> Result<BoardSnapshot, ImportError> {
    let object = as_object(value)?;

    if let Some(version) = object.get("version").and_then(Value::as_str) {
        if version != EXPORT_VERSION {
            log::warn!("Importing document with unknown version {version}");
        }
    }

    let notes_value = object.get("notes").ok_or(ImportError::NotesNotArray)?;
    let folders_value = object.get("folders").ok_or(ImportError::FoldersNotArray)?;
    let mut notes = parse_notes(Some(notes_value))?;
    let folders = parse_folders(folders_value)?;
    let next_z_index = parse_next_z_index(object.get("nextZIndex"))?;

    let unfiled = unfile_orphans(&mut notes, &folders);
    if unfiled > 0 {
        log::warn!("Unfiled {unfiled} note(s) referencing missing folders");
    }
    let renumbered = renumber_duplicate_z(&mut notes);
    if renumbered > 0 {
        log::warn!("Renumbered {renumbered} note(s) with duplicate zIndex");
    }

    let highest = notes.iter().map(|n| n.z_index).max().unwrap_or(0);
    Ok(BoardSnapshot {
        notes,
        folders,
        next_z_index: next_z_index.unwrap_or(1).max(highest + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteColor;
    use kurbo::{Point, Rect};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn note_json() -> Value {
        json!({
            "id": "1",
            "x": 0,
            "y": 0,
            "width": 240,
            "height": 240,
            "title": "Test",
            "content": "Content",
            "color": "#000",
            "zIndex": 1
        })
    }

    #[test]
    fn test_stored_notes_payload_shapes() {
        assert!(is_stored_notes_payload(&json!({ "notes": [note_json()], "nextZIndex": 2 })));
        assert!(is_stored_notes_payload(&json!({ "nextZIndex": 1 })));
        assert!(is_stored_notes_payload(&json!({ "notes": [] })));

        assert!(!is_stored_notes_payload(&Value::Null));
        assert!(!is_stored_notes_payload(&json!("invalid")));
        assert!(!is_stored_notes_payload(&json!(123)));
        assert!(!is_stored_notes_payload(&json!({ "notes": [], "nextZIndex": "invalid" })));
        assert!(!is_stored_notes_payload(&json!({ "notes": "invalid", "nextZIndex": 1 })));
        assert!(!is_stored_notes_payload(&json!({ "notes": [1, 2] })));
    }

    #[test]
    fn test_stored_folders_payload_shapes() {
        assert!(is_stored_folders_payload(&json!([])));
        assert!(is_stored_folders_payload(&json!([
            { "id": "1", "name": "Folder 1", "createdAt": 0, "x": 0, "y": 0 }
        ])));
        assert!(!is_stored_folders_payload(&Value::Null));
        assert!(!is_stored_folders_payload(&json!({})));
        assert!(!is_stored_folders_payload(&json!("invalid")));
        assert!(!is_stored_folders_payload(&json!(123)));
    }

    #[test]
    fn test_parse_stored_notes() {
        let json = json!({ "notes": [note_json()], "nextZIndex": 2 }).to_string();
        let payload = parse_stored_notes(&json).unwrap();
        assert_eq!(payload.notes.len(), 1);
        assert_eq!(payload.notes[0].title, "Test");
        // Unknown colour strings fall back to the default.
        assert_eq!(payload.notes[0].color, NoteColor::Black);
        assert_eq!(payload.next_z_index, Some(2));

        assert_eq!(parse_stored_notes("{}").unwrap(), StoredNotesPayload::default());
    }

    #[test]
    fn test_parse_stored_notes_rejections() {
        assert!(matches!(parse_stored_notes("{"), Err(ImportError::InvalidJson(_))));
        assert_eq!(parse_stored_notes("[]"), Err(ImportError::NotAnObject));
        assert_eq!(parse_stored_notes(r#"{"notes": "x"}"#), Err(ImportError::NotesNotArray));
        assert_eq!(
            parse_stored_notes(r#"{"nextZIndex": "x"}"#),
            Err(ImportError::InvalidNextZIndex)
        );
        assert_eq!(
            parse_stored_notes(r#"{"nextZIndex": -1}"#),
            Err(ImportError::InvalidNextZIndex)
        );
        assert!(matches!(
            parse_stored_notes(r#"{"notes": [{"id": "a"}]}"#),
            Err(ImportError::InvalidNote { index: 0, .. })
        ));
    }

    #[test]
    fn test_parse_stored_folders() {
        let folders = parse_stored_folders(r#"[{"id": "f", "name": "A", "createdAt": 5, "x": 40, "y": 60}]"#).unwrap();
        assert_eq!(folders[0].position(), Point::new(40.0, 60.0));
        assert_eq!(parse_stored_folders("{}"), Err(ImportError::FoldersNotArray));
        assert!(matches!(
            parse_stored_folders(r#"[{"name": 3}]"#),
            Err(ImportError::InvalidFolder { index: 0, .. })
        ));
    }

    #[test]
    fn test_export_document_fields() {
        let snapshot = BoardSnapshot {
            notes: vec![Note::new("n", Rect::new(0.0, 0.0, 240.0, 240.0), NoteColor::Red, 3)],
            folders: Vec::new(),
            next_z_index: 4,
        };
        let json = export_board(&snapshot).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["nextZIndex"], 4);
        assert_eq!(value["notes"][0]["color"], "#ff3b30");
        assert_eq!(value["notes"][0]["zIndex"], 3);
        assert!(chrono::DateTime::parse_from_rfc3339(value["exportedAt"].as_str().unwrap()).is_ok());

        assert_eq!(import_board(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_import_repairs_counter_and_orphans() {
        let json = json!({
            "notes": [
                {
                    "id": "a", "x": 0, "y": 0, "width": 240, "height": 240,
                    "zIndex": 9, "folderId": "missing"
                }
            ],
            "folders": []
        })
        .to_string();
        let snapshot = import_board(&json).unwrap();
        assert_eq!(snapshot.next_z_index, 10);
        assert_eq!(snapshot.notes[0].folder_id, None);
        assert!(snapshot.folders.is_empty());
    }

    #[test]
    fn test_import_renumbers_duplicate_z() {
        let note = |id: &str, z: u64| {
            json!({ "id": id, "x": 0, "y": 0, "width": 240, "height": 240, "zIndex": z })
        };
        let json = json!({
            "notes": [note("a", 3), note("b", 3), note("c", 4), note("d", 1)],
            "folders": []
        })
        .to_string();

        let snapshot = import_board(&json).unwrap();
        let z: Vec<(&str, u64)> = snapshot.notes.iter().map(|n| (n.id.as_str(), n.z_index)).collect();
        assert_eq!(z, vec![("a", 3), ("b", 4), ("c", 5), ("d", 1)]);
        assert_eq!(snapshot.next_z_index, 6);
    }

    #[test]
    fn test_renumber_leaves_unique_z_alone() {
        let mut notes = vec![
            Note::new("a", Rect::new(0.0, 0.0, 240.0, 240.0), NoteColor::Red, 7),
            Note::new("b", Rect::new(0.0, 0.0, 240.0, 240.0), NoteColor::Red, 2),
        ];
        assert_eq!(renumber_duplicate_z(&mut notes), 0);
        assert_eq!(notes[0].z_index, 7);
        assert_eq!(notes[1].z_index, 2);
    }

    #[test]
    fn test_import_rejections() {
        assert!(matches!(import_board("nope"), Err(ImportError::InvalidJson(_))));
        assert_eq!(import_board("42"), Err(ImportError::NotAnObject));
        assert_eq!(import_board("{}"), Err(ImportError::NotesNotArray));
        assert_eq!(import_board(r#"{"folders": []}"#), Err(ImportError::NotesNotArray));
        assert_eq!(import_board(r#"{"notes": []}"#), Err(ImportError::FoldersNotArray));
        assert_eq!(import_board(r#"{"notes": [], "folders": {}}"#), Err(ImportError::FoldersNotArray));
        assert!(matches!(
            import_board(r#"{"notes": [null], "folders": []}"#),
            Err(ImportError::InvalidNote { index: 0, .. })
        ));
    }
}
