pub mod activity;
pub mod attachments;
pub mod auth;
pub mod collaborations;
pub mod comments;
pub mod documents;
pub mod folders;
pub mod health;
pub mod notifications;
pub mod shares;
pub mod tags;
pub mod transfer;
pub mod versions;

use crate::api::error::AppError;
use axum::{extract::Multipart, http::StatusCode};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
pub(crate) fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

/// First multipart field named one of `names`, as (filename, bytes).
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
    names: &[&str],
) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Upload exceeds the size limit".to_string())
        } else {
            AppError::BadRequest(e.to_string())
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if !names.contains(&name.as_str()) {
            continue;
        }

        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge("Upload exceeds the size limit".to_string())
            } else {
                AppError::BadRequest(e.to_string())
            }
        })?;
        return Ok((filename, data.to_vec()));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        names.join("' or '")
    )))
}
