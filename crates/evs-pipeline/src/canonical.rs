use evs_core::errors::{ErrorInfo, EvsError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

fn encoding_error(code: &str, err: impl ToString) -> EvsError {
    EvsError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Rebuilds every object with its keys in lexicographic order.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|left, right| left.0.cmp(&right.0));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Compact JSON with sorted object keys, so equal values give equal bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, EvsError> {
    let mut tree =
        serde_json::to_value(value).map_err(|err| encoding_error("canonical.encode", err))?;
    sort_keys(&mut tree);
    serde_json::to_vec(&tree).map_err(|err| encoding_error("canonical.write", err))
}

/// Lowercase hex SHA-256 of the canonical JSON encoding.
///
/// Used as the configuration fingerprint recorded in run provenance.
pub fn digest_hex<T: Serialize>(value: &T) -> Result<String, EvsError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Parses a JSON document such as a written plot book or run summary.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, EvsError> {
    serde_json::from_slice(data).map_err(|err| encoding_error("json.parse", err))
}

/// Renders a run configuration back to YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, EvsError> {
    serde_yaml::to_string(value).map_err(|err| encoding_error("yaml.encode", err))
}

/// Parses a YAML run configuration.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, EvsError> {
    serde_yaml::from_slice(data).map_err(|err| encoding_error("yaml.parse", err))
}
