//! Resource encoding for the wire and for binary resource files.

use serde::Serialize;

use crate::resource::decoder::TYPE_FIELD;
use crate::resource::types::Resource;

/// Errors while encoding a resource.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("resource of type {0} has no payload to encode")]
    Unrecognized(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding failed: {0}")]
    Binary(#[from] rmp_serde::encode::Error),

    #[error("frame of {0} bytes exceeds the u32 length prefix")]
    TooLarge(usize),
}

/// Encode a resource as the `"@type"`-tagged JSON envelope sent in pushes.
pub fn to_json_envelope(resource: &Resource) -> Result<serde_json::Value, EncodeError> {
    let mut value = match resource {
        Resource::Cluster(c) => serde_json::to_value(c)?,
        Resource::EndpointAssignment(e) => serde_json::to_value(e)?,
        Resource::RouteConfiguration(r) => serde_json::to_value(r)?,
        Resource::Listener(l) => serde_json::to_value(l)?,
        Resource::Unrecognized { type_url } => {
            return Err(EncodeError::Unrecognized(type_url.clone()))
        }
    };
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(TYPE_FIELD.to_string(), serde_json::Value::String(resource.type_url()));
    }
    Ok(value)
}

/// Encode a resource in the `.bin` file format.
pub fn encode_binary(resource: &Resource) -> Result<Vec<u8>, EncodeError> {
    let payload = match resource {
        Resource::Cluster(c) => named(c)?,
        Resource::EndpointAssignment(e) => named(e)?,
        Resource::RouteConfiguration(r) => named(r)?,
        Resource::Listener(l) => named(l)?,
        Resource::Unrecognized { type_url } => {
            return Err(EncodeError::Unrecognized(type_url.clone()))
        }
    };

    let type_url = resource.type_url();
    let mut out = Vec::with_capacity(8 + type_url.len() + payload.len());
    push_frame(&mut out, type_url.as_bytes())?;
    push_frame(&mut out, &payload)?;
    Ok(out)
}

// Field names are kept so optional fields can be omitted.
fn named<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodeError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

fn push_frame(out: &mut Vec<u8>, frame: &[u8]) -> Result<(), EncodeError> {
    let len = u32::try_from(frame.len()).map_err(|_| EncodeError::TooLarge(frame.len()))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(frame);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::types::{Listener, SocketAddress};

    #[test]
    fn test_json_envelope_carries_type() {
        let listener = Resource::Listener(Listener {
            name: "http".into(),
            address: SocketAddress { host: "0.0.0.0".into(), port: 80 },
            stat_prefix: None,
            route_config_name: Some("r1".into()),
        });
        let value = to_json_envelope(&listener).unwrap();
        assert_eq!(value["@type"], "type.config-plane.dev/Listener");
        assert_eq!(value["route_config_name"], "r1");
        assert!(value.get("stat_prefix").is_none());
    }

    #[test]
    fn test_unrecognized_is_not_encodable() {
        let other = Resource::Unrecognized { type_url: "x/Secret".into() };
        assert!(matches!(to_json_envelope(&other), Err(EncodeError::Unrecognized(_))));
        assert!(matches!(encode_binary(&other), Err(EncodeError::Unrecognized(_))));
    }
}
