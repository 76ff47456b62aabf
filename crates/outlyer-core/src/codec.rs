//! Local ⇄ wire payload conversion.
//!
//! - Plugins travel inside a [`PluginEnvelope`]: the file name plus the
//!   file content, base64 encoded. Binary content round-trips unchanged.
//! - Checks are stored locally with `handler`/`env`; the v2 API names the
//!   same fields `format`/`variables`.
//! - Alerts and dashboards pass through verbatim.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::CodecError;
use crate::resource::ResourceKind;

/// Encoding tag carried by every plugin envelope
pub const PLUGIN_ENCODING: &str = "base64";

/// Check field names as `(local, remote)` pairs
pub static CHECK_FIELD_MAPPING: [(&str, &str); 2] = [("handler", "format"), ("env", "variables")];

/// Wire shape of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEnvelope {
    pub name: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub content: String,
}

impl PluginEnvelope {
    /// Wrap raw file bytes
    pub fn wrap(file_name: &str, raw: &[u8]) -> Self {
        PluginEnvelope {
            name: file_name.to_string(),
            encoding: PLUGIN_ENCODING.to_string(),
            content: STANDARD.encode(raw),
        }
    }

    /// Decode the content back to the raw file bytes
    pub fn unwrap_content(&self) -> Result<Vec<u8>, CodecError> {
        if !self.encoding.is_empty() && self.encoding != PLUGIN_ENCODING {
            return Err(CodecError::UnsupportedEncoding {
                name: self.name.clone(),
                encoding: self.encoding.clone(),
            });
        }
        // The API may fold long content over several lines
        let compact: String = self.content.split_whitespace().collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|source| CodecError::Base64 {
                name: self.name.clone(),
                source,
            })
    }
}

/// Convert a local file into the body sent to the API.
pub fn encode(kind: ResourceKind, raw: &[u8], file_name: &str) -> Result<Vec<u8>, CodecError> {
    match kind {
        ResourceKind::Plugins => {
            let envelope = PluginEnvelope::wrap(file_name, raw);
            Ok(serde_yaml::to_string(&envelope)?.into_bytes())
        }
        ResourceKind::Checks => {
            let mapping = parse_mapping(raw)?;
            let renamed = rename_fields(mapping, CHECK_FIELD_MAPPING.iter().copied())?;
            Ok(serde_yaml::to_string(&renamed)?.into_bytes())
        }
        ResourceKind::Alerts | ResourceKind::Dashboards => Ok(raw.to_vec()),
    }
}

/// Convert an API document into local file bytes.
pub fn decode(kind: ResourceKind, wire: &[u8]) -> Result<Vec<u8>, CodecError> {
    match kind {
        ResourceKind::Plugins | ResourceKind::Checks => {
            let doc: Value = serde_yaml::from_slice(wire)?;
            decode_document(kind, doc)
        }
        ResourceKind::Alerts | ResourceKind::Dashboards => Ok(wire.to_vec()),
    }
}

/// Convert one already-parsed API document into local file bytes.
///
/// Used for collections, where documents arrive as a YAML sequence and
/// non-plugin documents are re-serialized individually.
pub fn decode_document(kind: ResourceKind, doc: Value) -> Result<Vec<u8>, CodecError> {
    match kind {
        ResourceKind::Plugins => {
            let envelope: PluginEnvelope = serde_yaml::from_value(doc)?;
            envelope.unwrap_content()
        }
        ResourceKind::Checks => {
            let mapping = into_mapping(doc)?;
            let inverse = CHECK_FIELD_MAPPING.iter().map(|(local, remote)| (*remote, *local));
            let renamed = rename_fields(mapping, inverse)?;
            Ok(serde_yaml::to_string(&renamed)?.into_bytes())
        }
        ResourceKind::Alerts | ResourceKind::Dashboards => {
            Ok(serde_yaml::to_string(&doc)?.into_bytes())
        }
    }
}

/// The `name` field of an API document
pub fn document_name(doc: &Value) -> Result<String, CodecError> {
    doc.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CodecError::MissingField("name"))
}

fn parse_mapping(raw: &[u8]) -> Result<Mapping, CodecError> {
    into_mapping(serde_yaml::from_slice(raw)?)
}

fn into_mapping(doc: Value) -> Result<Mapping, CodecError> {
    match doc {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(CodecError::NotAMapping),
    }
}

/// Rename `from` keys to `to` keys, keeping key order.
fn rename_fields<'a>(
    mapping: Mapping,
    pairs: impl Iterator<Item = (&'a str, &'a str)> + Clone,
) -> Result<Mapping, CodecError> {
    for (from, to) in pairs.clone() {
        if mapping.get(from).is_some() && mapping.get(to).is_some() {
            let (local, remote) = local_remote(from, to);
            return Err(CodecError::ConflictingFields { local, remote });
        }
    }

    let mut renamed = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        let rename_to = key
            .as_str()
            .and_then(|k| pairs.clone().find(|(from, _)| *from == k))
            .map(|(_, to)| to);
        let key = match rename_to {
            Some(to) => Value::String(to.to_string()),
            None => key,
        };
        renamed.insert(key, value);
    }
    Ok(renamed)
}

fn local_remote(a: &str, b: &str) -> (&'static str, &'static str) {
    CHECK_FIELD_MAPPING
        .iter()
        .copied()
        .find(|(local, remote)| (*local == a && *remote == b) || (*local == b && *remote == a))
        .unwrap_or(("handler", "format"))
}
