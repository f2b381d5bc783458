//! HTTP handlers for uploading and fetching files.
//! Streams bodies in both directions and delegates storage concerns to
//! `StorageService`.

use crate::{
    errors::AppError,
    handlers::challenge::Challenge,
    models::{
        metadata::Metadata,
        upload::{UploadResponse, UploadedFile},
    },
    services::{
        identifier::ObjectName,
        sanitize::{extension, sanitize},
        storage_service::{Retrieval, StorageError},
    },
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{
        Form, Multipart, Path, Query, State,
        multipart::MultipartError,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::io;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// Field carrying the credential, in uploads and on retrieval.
const FIELD_PASSWORD: &str = "password";
/// Multipart field switching on self-destruct for the files that follow.
const FIELD_SELFDESTRUCT: &str = "private-selfdestruct";
const FIELD_FILES: &str = "files";

/// Urlencoded key/value pairs in request order. Repeated keys are kept, so
/// the first `password` wins instead of failing the whole extraction.
type FormPairs = Vec<(String, String)>;

/// `POST /new` — store every `files` part of a multipart body.
///
/// Parts are processed in order: a `password` part authenticates the rest of
/// the request, `private-selfdestruct=on` flags the files after it.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut authenticated = false;
    let mut private_selfdestruct = false;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_PASSWORD => {
                let credential = field.text().await.map_err(multipart_error)?;
                if !state.auth.authenticate(&credential) {
                    warn!("upload rejected: invalid credential");
                    return Err(AppError::unauthorized());
                }
                authenticated = true;
            }
            FIELD_SELFDESTRUCT => {
                if field.text().await.map_err(multipart_error)? == "on" {
                    private_selfdestruct = true;
                }
            }
            FIELD_FILES => {
                if !authenticated {
                    warn!("upload rejected: file part before authentication");
                    return Err(AppError::unauthorized());
                }

                let filename = sanitize(field.file_name().unwrap_or_default());
                debug!("receiving part {:?}", filename);

                let stream = field.map(|chunk| chunk.map_err(io::Error::other));
                let stored = state
                    .storage
                    .upload_object_stream(&filename, private_selfdestruct, stream)
                    .await
                    .map_err(upload_error)?;

                info!("uploaded {} as {:?}", stored.id, filename);
                uploads.push(UploadedFile {
                    url: format!("/{}{}", stored.id, sanitize(extension(&filename))),
                    filename,
                });
            }
            other => {
                return Err(AppError::bad_request(format!(
                    "unexpected field `{}`",
                    sanitize(other)
                )));
            }
        }
    }

    if !authenticated {
        return Err(AppError::unauthorized());
    }

    Ok(Json(UploadResponse { ok: true, uploads }))
}

/// `GET /{name}` — fetch a file; the credential may come from the query.
///
/// A link that does not even decode is answered like any other bad link.
pub async fn get_file(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
    query: Result<Query<FormPairs>, QueryRejection>,
) -> Result<Response, AppError> {
    let name = link_name(name)?;
    let password = query_password(query);
    serve_file(&state, &name, password.as_deref()).await
}

/// `POST /{name}` — fetch a file with the credential in a urlencoded form,
/// which is what the challenge page submits. A form credential takes
/// precedence over one in the query.
pub async fn post_file(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
    query: Result<Query<FormPairs>, QueryRejection>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Result<Response, AppError> {
    let name = link_name(name)?;
    let password = form_password(form).or_else(|| query_password(query));
    serve_file(&state, &name, password.as_deref()).await
}

fn link_name(name: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    match name {
        Ok(Path(name)) => Ok(name),
        Err(err) => {
            debug!("undecodable link: {}", err.body_text());
            Err(AppError::not_found())
        }
    }
}

/// An unreadable query string counts as no credential.
fn query_password(query: Result<Query<FormPairs>, QueryRejection>) -> Option<String> {
    match query {
        Ok(Query(pairs)) => first_password(pairs),
        Err(err) => {
            debug!("ignoring query string: {}", err.body_text());
            None
        }
    }
}

fn form_password(form: Result<Form<FormPairs>, FormRejection>) -> Option<String> {
    match form {
        Ok(Form(pairs)) => first_password(pairs),
        Err(err) => {
            debug!("ignoring form body: {}", err.body_text());
            None
        }
    }
}

fn first_password(pairs: FormPairs) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == FIELD_PASSWORD)
        .map(|(_, value)| value)
}

async fn serve_file(
    state: &AppState,
    name: &str,
    password: Option<&str>,
) -> Result<Response, AppError> {
    let parsed = ObjectName::parse(name)?;

    match state
        .storage
        .retrieve(&parsed.id, password, &state.auth)
        .await?
    {
        Retrieval::AuthRequired => Ok(Challenge::new(name).into_response()),
        Retrieval::Ready { metadata, file } => {
            let body = Body::from_stream(ReaderStream::new(file));
            let mut response = Response::new(body);
            *response.status_mut() = StatusCode::OK;
            set_file_headers(response.headers_mut(), &metadata);
            Ok(response)
        }
    }
}

fn set_file_headers(headers: &mut HeaderMap, meta: &Metadata) {
    let display_name = sanitize(&meta.filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("filename=\"{}\"", display_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    let content_type = mime_guess::from_path(&meta.filename).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.size));
}

fn multipart_error(err: MultipartError) -> AppError {
    debug!("malformed multipart body: {}", err);
    AppError::new(err.status(), err.body_text())
}

/// Keep client-side multipart failures (body too large, truncated stream)
/// out of the 5xx range.
fn upload_error(err: StorageError) -> AppError {
    if let StorageError::Io(io_err) = &err {
        if let Some(multipart) = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            return AppError::new(multipart.status(), multipart.body_text());
        }
    }
    err.into()
}
