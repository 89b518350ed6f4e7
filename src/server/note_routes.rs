//! Note routes. Reads are public, mutations need a session.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error_response::error_response;
use super::http_cache;
use super::session::Session;
use super::state::ServerState;
use crate::concert_store::{Note, NoteId, ShowId};
use crate::listing::{ListingService, Page, PageRequest, ShowDetail};
use crate::notes::{NewNote, NoteDetail, NoteEdit, NoteService, PhotoChange, PhotoUpload};
use crate::photo_storage::image_mime_type;
use crate::service_error::ServiceResult;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Serialize)]
struct ShowNotes {
    show: ShowDetail,
    notes: Page<Note>,
}

/// Fields of a submitted note form.
#[derive(Debug, Default)]
struct NoteForm {
    title: String,
    text: String,
    photo: Option<PhotoUpload>,
    clear_photo: bool,
}

impl NoteForm {
    fn into_new_note(self) -> NewNote {
        NewNote {
            title: self.title,
            text: self.text,
            photo: self.photo,
        }
    }

    fn into_edit(self) -> NoteEdit {
        let photo = match (self.photo, self.clear_photo) {
            (Some(upload), true) => PhotoChange::ReplaceAndClear(upload),
            (Some(upload), false) => PhotoChange::Replace(upload),
            (None, true) => PhotoChange::Clear,
            (None, false) => PhotoChange::Keep,
        };
        NoteEdit {
            title: self.title,
            text: self.text,
            photo,
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

async fn read_note_form(mut multipart: Multipart) -> Result<NoteForm, Response> {
    let mut form = NoteForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Malformed note form: {}", err);
                return Err(error_response(err.status(), err.body_text()));
            }
        };

        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to read note form field {}: {}", name, err);
                return Err(error_response(err.status(), err.body_text()));
            }
        };

        match name.as_str() {
            "title" => form.title = String::from_utf8_lossy(&bytes).into_owned(),
            "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
            "clear_photo" => form.clear_photo = is_checked(&String::from_utf8_lossy(&bytes)),
            "photo" => {
                let file_name = file_name.unwrap_or_default();
                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.photo = Some(PhotoUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!("Ignoring unknown note form field {}", other),
        }
    }

    Ok(form)
}

async fn get_show_notes(
    State(listing): State<ListingService>,
    State(notes): State<NoteService>,
    Path(show_id): Path<ShowId>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<ShowNotes>> {
    let page = notes.list_notes_for_show(show_id, PageRequest::parse(query.page.as_deref()))?;
    let show = listing.get_show(show_id)?;
    Ok(Json(ShowNotes { show, notes: page }))
}

async fn post_note(
    session: Session,
    State(notes): State<NoteService>,
    Path(show_id): Path<ShowId>,
    multipart: Multipart,
) -> Response {
    let form = match read_note_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    match notes.create_note(session.user_id, show_id, form.into_new_note()) {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_latest_notes(
    State(notes): State<NoteService>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<Page<Note>>> {
    Ok(Json(
        notes.list_latest_notes(PageRequest::parse(query.page.as_deref()))?,
    ))
}

async fn get_note(
    State(notes): State<NoteService>,
    Path(id): Path<NoteId>,
) -> ServiceResult<Json<NoteDetail>> {
    Ok(Json(notes.get_note_detail(id)?))
}

async fn put_note(
    session: Session,
    State(notes): State<NoteService>,
    Path(id): Path<NoteId>,
    multipart: Multipart,
) -> Response {
    let form = match read_note_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    match notes.edit_note(session.user_id, id, form.into_edit()) {
        Ok(note) => Json(note).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_note(
    session: Session,
    State(notes): State<NoteService>,
    Path(id): Path<NoteId>,
) -> ServiceResult<StatusCode> {
    notes.delete_note(session.user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_note_photo(
    State(notes): State<NoteService>,
    Path(id): Path<NoteId>,
) -> ServiceResult<Response> {
    let Some(bytes) = notes.get_note_photo(id)? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let content_type = image_mime_type(&bytes).unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

pub fn make_note_routes(state: &ServerState) -> Router<ServerState> {
    let photo_routes = Router::new()
        .route("/notes/{id}/photo", get(get_note_photo))
        .layer(middleware::from_fn_with_state(
            state.config.content_cache_age_sec,
            http_cache,
        ));

    // Leave room for the text fields on top of the largest accepted photo.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/shows/{id}/notes", get(get_show_notes).post(post_note))
        .route("/notes", get(get_latest_notes))
        .route(
            "/notes/{id}",
            get(get_note).put(put_note).delete(delete_note),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .merge(photo_routes)
}
