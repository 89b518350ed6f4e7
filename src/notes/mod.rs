mod note_service;
mod photo_lifecycle;

pub use note_service::{
    Clock, NewNote, NoteDetail, NoteEdit, NoteService, PhotoChange, PhotoUpload, ShareTags,
    SystemClock, TITLE_MAX_CHARS,
};
pub use photo_lifecycle::{PhotoCleanup, PhotoLifecycle};
