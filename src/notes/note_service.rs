//! Note creation, retrieval, editing and deletion.
//!
//! Every mutation follows the same order: look the note (or show) up, check
//! ownership, validate input, save any new photo, persist, and only then
//! clean up the photo the record no longer points at.

use super::photo_lifecycle::PhotoLifecycle;
use crate::concert_store::{
    ConcertStore, NewNoteRecord, Note, NoteFilter, NoteId, ShowId, Window,
};
use crate::listing::{ListingService, Page, PageRequest, ShowDetail};
use crate::photo_storage::{image_mime_type, PhotoStorage};
use crate::server::metrics;
use crate::service_error::{EntityKind, ServiceError, ServiceResult, ValidationErrors};
use byte_unit::Byte;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const TITLE_MAX_CHARS: usize = 200;

const REQUIRED_MESSAGE: &str = "This field is required.";
const PHOTO_CONFLICT_MESSAGE: &str =
    "Please either submit a file or check the clear checkbox, not both.";

pub trait Clock: Send + Sync {
    /// Current time as Unix milliseconds.
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// An uploaded photo, not yet stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub photo: Option<PhotoUpload>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PhotoChange {
    #[default]
    Keep,
    Replace(PhotoUpload),
    Clear,
    /// An upload submitted together with a clear request. Rejected as a
    /// validation error once the note and its ownership are checked.
    ReplaceAndClear(PhotoUpload),
}

#[derive(Clone, Debug)]
pub struct NoteEdit {
    pub title: String,
    pub text: String,
    pub photo: PhotoChange,
}

/// Hashtag-ready strings for sharing a note: whitespace stripped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShareTags {
    pub artist: String,
    pub venue: String,
    pub location: String,
}

impl ShareTags {
    fn from_show(show: &ShowDetail) -> Self {
        fn squash(parts: &[&str]) -> String {
            parts
                .iter()
                .flat_map(|p| p.split_whitespace())
                .collect::<String>()
        }
        ShareTags {
            artist: squash(&[&show.artist.name]),
            venue: squash(&[&show.venue.name]),
            location: squash(&[&show.venue.city, &show.venue.state]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub show: ShowDetail,
    pub share_tags: ShareTags,
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn ConcertStore>,
    listing: ListingService,
    photo_storage: Arc<dyn PhotoStorage>,
    photo_lifecycle: PhotoLifecycle,
    clock: Arc<dyn Clock>,
    page_size: usize,
    max_photo_bytes: usize,
}

impl NoteService {
    pub fn new(
        store: Arc<dyn ConcertStore>,
        listing: ListingService,
        photo_storage: Arc<dyn PhotoStorage>,
        max_photo_bytes: usize,
    ) -> Self {
        let page_size = listing.page_sizes().notes;
        NoteService {
            store,
            listing,
            photo_lifecycle: PhotoLifecycle::new(photo_storage.clone()),
            photo_storage,
            clock: Arc::new(SystemClock),
            page_size,
            max_photo_bytes,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn create_note(&self, user_id: usize, show_id: ShowId, new_note: NewNote) -> ServiceResult<Note> {
        let result = self.create_note_inner(user_id, show_id, new_note);
        record_outcome("create", &result);
        result
    }

    fn create_note_inner(
        &self,
        user_id: usize,
        show_id: ShowId,
        new_note: NewNote,
    ) -> ServiceResult<Note> {
        if self.store.get_show(show_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Show, show_id));
        }

        let (title, text) = self.validate(
            ValidationErrors::new(),
            &new_note.title,
            &new_note.text,
            new_note.photo.as_ref(),
        )?;

        let photo = match &new_note.photo {
            Some(upload) => Some(self.photo_storage.save(&upload.bytes, &upload.file_name)?),
            None => None,
        };

        let record = NewNoteRecord {
            user_id,
            show_id,
            title,
            text,
            photo,
            posted_date: self.clock.now_millis(),
        };
        let note = match self.store.create_note(&record) {
            Ok(note) => note,
            Err(err) => {
                self.discard_saved_photo(record.photo.as_deref());
                return Err(err.into());
            }
        };

        info!(
            "User {} created note {} for show {}",
            user_id, note.id, note.show_id
        );
        Ok(note)
    }

    pub fn edit_note(&self, user_id: usize, note_id: NoteId, edit: NoteEdit) -> ServiceResult<Note> {
        let result = self.edit_note_inner(user_id, note_id, edit);
        record_outcome("edit", &result);
        result
    }

    fn edit_note_inner(&self, user_id: usize, note_id: NoteId, edit: NoteEdit) -> ServiceResult<Note> {
        let mut note = self.owned_note(user_id, note_id)?;

        let mut errors = ValidationErrors::new();
        let upload = match &edit.photo {
            PhotoChange::Replace(upload) => Some(upload),
            PhotoChange::ReplaceAndClear(_) => {
                errors.add("photo", PHOTO_CONFLICT_MESSAGE);
                None
            }
            PhotoChange::Keep | PhotoChange::Clear => None,
        };
        let (title, text) = self.validate(errors, &edit.title, &edit.text, upload)?;

        let previous_photo = note.photo.clone();
        let saved_photo = match upload {
            Some(upload) => Some(self.photo_storage.save(&upload.bytes, &upload.file_name)?),
            None => None,
        };
        note.title = title;
        note.text = text;
        note.photo = match edit.photo {
            PhotoChange::Keep => previous_photo.clone(),
            PhotoChange::Replace(_) => saved_photo.clone(),
            // ReplaceAndClear never gets past validation.
            PhotoChange::Clear | PhotoChange::ReplaceAndClear(_) => None,
        };

        match self.store.update_note(&note) {
            Ok(true) => {}
            Ok(false) => {
                self.discard_saved_photo(saved_photo.as_deref());
                return Err(ServiceError::not_found(EntityKind::Note, note_id));
            }
            Err(err) => {
                self.discard_saved_photo(saved_photo.as_deref());
                return Err(err.into());
            }
        }

        self.photo_lifecycle
            .after_update(previous_photo.as_deref(), note.photo.as_deref());
        info!("User {} edited note {}", user_id, note_id);
        Ok(note)
    }

    pub fn delete_note(&self, user_id: usize, note_id: NoteId) -> ServiceResult<()> {
        let result = self.delete_note_inner(user_id, note_id);
        record_outcome("delete", &result);
        result
    }

    fn delete_note_inner(&self, user_id: usize, note_id: NoteId) -> ServiceResult<()> {
        let note = self.owned_note(user_id, note_id)?;

        if !self.store.delete_note(note_id)? {
            return Err(ServiceError::not_found(EntityKind::Note, note_id));
        }

        self.photo_lifecycle.after_delete(note.photo.as_deref());
        info!("User {} deleted note {}", user_id, note_id);
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_note(&self, note_id: NoteId) -> ServiceResult<Note> {
        self.store
            .get_note(note_id)?
            .ok_or(ServiceError::not_found(EntityKind::Note, note_id))
    }

    pub fn get_note_detail(&self, note_id: NoteId) -> ServiceResult<NoteDetail> {
        let note = self.get_note(note_id)?;
        let show = self.listing.get_show(note.show_id)?;
        let share_tags = ShareTags::from_show(&show);
        Ok(NoteDetail {
            note,
            show,
            share_tags,
        })
    }

    /// Bytes of the note's photo. `None` when it has none or the blob is gone.
    pub fn get_note_photo(&self, note_id: NoteId) -> ServiceResult<Option<Vec<u8>>> {
        let note = self.get_note(note_id)?;
        let Some(path) = note.photo else {
            return Ok(None);
        };
        Ok(self.photo_storage.read(&path)?)
    }

    pub fn list_notes_for_show(&self, show_id: ShowId, page: PageRequest) -> ServiceResult<Page<Note>> {
        if self.store.get_show(show_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Show, show_id));
        }
        self.list_notes_page(NoteFilter::Show(show_id), page)
    }

    pub fn list_notes_for_user(&self, user_id: usize) -> ServiceResult<Vec<Note>> {
        Ok(self
            .store
            .list_notes(NoteFilter::User(user_id), Window::all())?)
    }

    pub fn list_latest_notes(&self, page: PageRequest) -> ServiceResult<Page<Note>> {
        self.list_notes_page(NoteFilter::All, page)
    }

    fn list_notes_page(&self, filter: NoteFilter, page: PageRequest) -> ServiceResult<Page<Note>> {
        let total = self.store.count_notes(filter)?;
        Ok(Page::fetch(total, self.page_size, page, |window| {
            self.store.list_notes(filter, window)
        })?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Loads a note and checks that `user_id` wrote it.
    fn owned_note(&self, user_id: usize, note_id: NoteId) -> ServiceResult<Note> {
        let note = self.get_note(note_id)?;
        if note.user_id != user_id {
            warn!(
                "User {} tried to modify note {} owned by user {}",
                user_id, note_id, note.user_id
            );
            return Err(ServiceError::Forbidden);
        }
        Ok(note)
    }

    /// Returns the trimmed title and text, or every field error found,
    /// including any already in `errors`.
    fn validate(
        &self,
        mut errors: ValidationErrors,
        title: &str,
        text: &str,
        photo: Option<&PhotoUpload>,
    ) -> ServiceResult<(String, String)> {
        let title = title.trim();
        let text = text.trim();

        if title.is_empty() {
            errors.add("title", REQUIRED_MESSAGE);
        } else {
            let title_chars = title.chars().count();
            if title_chars > TITLE_MAX_CHARS {
                errors.add(
                    "title",
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        TITLE_MAX_CHARS, title_chars
                    ),
                );
            }
        }
        if text.is_empty() {
            errors.add("text", REQUIRED_MESSAGE);
        }
        if let Some(upload) = photo {
            self.validate_photo(upload, &mut errors);
        }

        errors.into_result()?;
        Ok((title.to_string(), text.to_string()))
    }

    fn validate_photo(&self, upload: &PhotoUpload, errors: &mut ValidationErrors) {
        if upload.bytes.is_empty() {
            errors.add("photo", "The submitted file is empty.");
            return;
        }
        if upload.bytes.len() > self.max_photo_bytes {
            errors.add(
                "photo",
                format!(
                    "The photo is too large ({:#}, max {:#}).",
                    Byte::from(upload.bytes.len()),
                    Byte::from(self.max_photo_bytes)
                ),
            );
            return;
        }
        if image_mime_type(&upload.bytes).is_none() {
            errors.add(
                "photo",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            );
        }
    }

    /// Removes a photo saved for a mutation that then failed to persist.
    fn discard_saved_photo(&self, path: Option<&str>) {
        let Some(path) = path else {
            return;
        };
        if let Err(err) = self.photo_storage.delete(path) {
            warn!("Failed to discard orphaned photo {}: {}", path, err);
        }
    }
}

fn record_outcome<T>(operation: &str, result: &ServiceResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.label(),
    };
    metrics::record_note_mutation(operation, outcome);
}
