//! Resource file decoding.
//!
//! # Data Flow
//! ```text
//! file path
//!     → Encoding::from_path (extension → format)
//!     → open envelope ("@type" + payload)
//!     → typed payload (serde)
//!     → Validate::validate
//!     → Resource
//! ```
//!
//! # Design Decisions
//! - Format is chosen by extension only; unknown extensions never reach here
//!   (the scanner filters them with `is_decodable`)
//! - Every failure carries the file path so one log line is enough to fix it
//! - A well-formed type URL naming an unknown type is not an error; it
//!   becomes `Resource::Unrecognized` and the classifier drops it

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::resource::kind::ResourceKind;
use crate::resource::types::{Cluster, EndpointAssignment, Listener, Resource, RouteConfiguration};
use crate::resource::validation::{Validate, ValidationError};

/// Envelope member holding the type URL in textual formats.
pub const TYPE_FIELD: &str = "@type";

/// Why a single file could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeCause {
    #[error("unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("malformed binary payload: {0}")]
    Binary(#[from] rmp_serde::decode::Error),

    #[error("malformed binary envelope: {0}")]
    Framing(&'static str),

    #[error("envelope must be an object with a '{TYPE_FIELD}' string member")]
    MissingType,

    #[error("invalid type URL '{0}'")]
    InvalidTypeUrl(String),

    #[error("{type_url} failed validation: {source}")]
    Validation {
        type_url: String,
        #[source]
        source: ValidationError,
    },
}

/// A file that failed to decode.
#[derive(Debug, Error)]
#[error("{}: {cause}", .path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub cause: DecodeCause,
}

/// Supported on-disk encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `.json`: object with an `"@type"` member.
    Json,
    /// `.toml`: table with a quoted `"@type"` key.
    Toml,
    /// `.bin`: length-prefixed type URL followed by a length-prefixed
    /// MessagePack payload.
    Binary,
}

impl Encoding {
    /// Pick an encoding from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Encoding::Json),
            "toml" => Some(Encoding::Toml),
            "bin" => Some(Encoding::Binary),
            _ => None,
        }
    }
}

/// True if the scanner should hand this file to the decoder.
///
/// Dot-files are skipped even when their extension is supported (editor
/// swap files, `.#lock` files and the like).
pub fn is_decodable(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    !hidden && Encoding::from_path(path).is_some()
}

/// Read and decode one resource file.
pub fn decode_file(path: &Path) -> Result<Resource, DecodeError> {
    let fail = |cause: DecodeCause| DecodeError { path: path.to_path_buf(), cause };

    let encoding = Encoding::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        fail(DecodeCause::UnsupportedExtension(ext))
    })?;

    let bytes = std::fs::read(path).map_err(|e| fail(e.into()))?;
    decode_bytes(encoding, &bytes).map_err(fail)
}

/// Decode an in-memory document in the given encoding.
pub fn decode_bytes(encoding: Encoding, bytes: &[u8]) -> Result<Resource, DecodeCause> {
    let envelope = match encoding {
        Encoding::Json => open_json(bytes)?,
        Encoding::Toml => open_toml(bytes)?,
        Encoding::Binary => open_binary(bytes)?,
    };
    envelope.into_resource()
}

/// Outer type-tagged wrapper, payload still untyped.
struct Envelope {
    type_url: String,
    payload: Payload,
}

enum Payload {
    Json(serde_json::Map<String, serde_json::Value>),
    Toml(toml::Table),
    Binary(Vec<u8>),
}

impl Payload {
    fn into_typed<T: DeserializeOwned>(self) -> Result<T, DecodeCause> {
        Ok(match self {
            Payload::Json(map) => serde_json::from_value(serde_json::Value::Object(map))?,
            Payload::Toml(table) => toml::Value::Table(table).try_into()?,
            Payload::Binary(bytes) => rmp_serde::from_slice(&bytes)?,
        })
    }
}

impl Envelope {
    fn into_resource(self) -> Result<Resource, DecodeCause> {
        let Envelope { type_url, payload } = self;
        let kind = match ResourceKind::from_type_url(&type_url) {
            Some(kind) => kind,
            None => {
                check_type_url(&type_url)?;
                return Ok(Resource::Unrecognized { type_url });
            }
        };

        Ok(match kind {
            ResourceKind::Cluster => Resource::Cluster(typed::<Cluster>(payload, &type_url)?),
            ResourceKind::EndpointAssignment => {
                Resource::EndpointAssignment(typed::<EndpointAssignment>(payload, &type_url)?)
            }
            ResourceKind::RouteConfiguration => {
                Resource::RouteConfiguration(typed::<RouteConfiguration>(payload, &type_url)?)
            }
            ResourceKind::Listener => Resource::Listener(typed::<Listener>(payload, &type_url)?),
        })
    }
}

fn typed<T: DeserializeOwned + Validate>(payload: Payload, type_url: &str) -> Result<T, DecodeCause> {
    let value: T = payload.into_typed()?;
    value.validate().map_err(|source| DecodeCause::Validation {
        type_url: type_url.to_string(),
        source,
    })?;
    Ok(value)
}

/// A type URL is `<authority>/<TypeName>`; only the shape is checked.
fn check_type_url(type_url: &str) -> Result<(), DecodeCause> {
    let well_formed = match type_url.rsplit_once('/') {
        Some((_, name)) => !name.is_empty() && !type_url.chars().any(char::is_whitespace),
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(DecodeCause::InvalidTypeUrl(type_url.to_string()))
    }
}

fn open_json(bytes: &[u8]) -> Result<Envelope, DecodeCause> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Object(mut map) = value else {
        return Err(DecodeCause::MissingType);
    };
    let type_url = match map.remove(TYPE_FIELD) {
        Some(serde_json::Value::String(s)) => s,
        _ => return Err(DecodeCause::MissingType),
    };
    Ok(Envelope { type_url, payload: Payload::Json(map) })
}

fn open_toml(bytes: &[u8]) -> Result<Envelope, DecodeCause> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeCause::Framing("TOML is not UTF-8"))?;
    let mut table: toml::Table = toml::from_str(text)?;
    let type_url = match table.remove(TYPE_FIELD) {
        Some(toml::Value::String(s)) => s,
        _ => return Err(DecodeCause::MissingType),
    };
    Ok(Envelope { type_url, payload: Payload::Toml(table) })
}

fn open_binary(bytes: &[u8]) -> Result<Envelope, DecodeCause> {
    let (type_bytes, rest) = take_frame(bytes)?;
    let (payload, rest) = take_frame(rest)?;
    if !rest.is_empty() {
        return Err(DecodeCause::Framing("trailing bytes after payload"));
    }
    let type_url = std::str::from_utf8(type_bytes)
        .map_err(|_| DecodeCause::Framing("type URL is not UTF-8"))?
        .to_string();
    if type_url.is_empty() {
        return Err(DecodeCause::MissingType);
    }
    Ok(Envelope { type_url, payload: Payload::Binary(payload.to_vec()) })
}

/// Split one `u32`-big-endian length-prefixed frame off the front.
fn take_frame(bytes: &[u8]) -> Result<(&[u8], &[u8]), DecodeCause> {
    let Some((len, rest)) = bytes.split_first_chunk::<4>() else {
        return Err(DecodeCause::Framing("truncated length prefix"));
    };
    let len = u32::from_be_bytes(*len) as usize;
    if rest.len() < len {
        return Err(DecodeCause::Framing("frame shorter than its length prefix"));
    }
    Ok(rest.split_at(len))
}
