use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tracing::warn;

use crate::error::Result;
use crate::json::{invalid_reply, parse_object, required_object, required_str, required_u64};

/// One entry describing an available update, returned by
/// [`check_for_updates`](crate::Client::check_for_updates).
///
/// The three download fields are populated only when the package type is
/// the literal `"file"`; for any other package type the descriptor is
/// returned partially populated (`size` zero, no md5, no download URL)
/// rather than rejected.
///
/// The serde impls use the backend's camelCase field names, so a persisted
/// descriptor keeps the same shape as the `updates` entry it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Update {
    /// Update type.
    pub update_type: String,
    /// Package type; only `"file"` carries the download fields.
    pub package_type: String,
    /// Update identifier.
    pub update_id: String,
    /// Update version.
    pub version: String,
    /// Free-form metadata, order-independent, keys unique.
    pub metadata: HashMap<String, String>,
    /// Package size in bytes; zero unless the package type is `"file"`.
    pub size: u64,
    /// Package md5 checksum; present only for `"file"` packages.
    pub md5: Option<String>,
    /// Package download URL; present only for `"file"` packages.
    pub download_url: Option<String>,
}

// Metadata values must all be strings. Duplicate keys inside one json
// object collapse to the last occurrence at parse time, so the last write
// wins here. Note the asymmetry with the outbound report objects, where
// the first write wins.
fn decode_metadata(object: &Map<String, Value>) -> Result<HashMap<String, String>> {
    let metadata = required_object(object, "metadata")?;

    let mut decoded = HashMap::with_capacity(metadata.len());
    for (key, value) in metadata {
        let value = value.as_str().ok_or_else(|| {
            invalid_reply("Server reply invalid: metadata value is not a string".into())
        })?;
        decoded.insert(key.clone(), value.to_owned());
    }

    Ok(decoded)
}

fn decode_update(entry: &Value) -> Result<Update> {
    let object = entry.as_object().ok_or_else(|| {
        invalid_reply("Server reply invalid: update entry is not an object".into())
    })?;

    let metadata = decode_metadata(object)?;
    let update_type = required_str(object, "updateType")?;
    let package_type = required_str(object, "packageType")?;
    let update_id = required_str(object, "updateId")?;
    let version = required_str(object, "version")?;

    let mut update = Update {
        update_type,
        package_type,
        update_id,
        version,
        metadata,
        size: 0,
        md5: None,
        download_url: None,
    };

    // Only "file" packages carry the download fields. Any other package
    // type yields a partially populated descriptor, and decoding moves on
    // to the next entry.
    if update.package_type == "file" {
        update.size = required_u64(object, "size")?;
        update.md5 = Some(required_str(object, "md5")?);
        update.download_url = Some(required_str(object, "downloadUrl")?);
    } else {
        warn!(
            "Received update of type \"{}\", not processing further.",
            update.package_type
        );
    }

    Ok(update)
}

/// Decodes a check-for-updates response body into an ordered sequence of
/// [`Update`] descriptors, one per entry of the `updates` array.
pub(crate) fn decode_update_list(raw: &str) -> Result<Vec<Update>> {
    let root = parse_object(raw)?;

    let updates = root
        .get("updates")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            invalid_reply("Server reply invalid: \"updates\" was not an array".into())
        })?;

    updates.iter().map(decode_update).collect()
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::{Update, decode_update_list};

    fn file_update_json(update_id: &str) -> String {
        format!(
            r#"{{
                "updateType": "firmware",
                "packageType": "file",
                "updateId": "{update_id}",
                "version": "1.2.3",
                "metadata": {{ "release": "stable" }},
                "size": 4096,
                "md5": "d41d8cd98f00b204e9800998ecf8427e",
                "downloadUrl": "https://cdn.backend.local/fw.bin"
            }}"#
        )
    }

    #[test]
    fn empty_updates_array_yields_no_descriptors() {
        let updates = decode_update_list(r#"{"updates": []}"#).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn file_update_is_fully_populated() {
        let raw = format!(r#"{{"updates": [{}]}}"#, file_update_json("u-1"));

        let updates = decode_update_list(&raw).unwrap();

        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.update_type, "firmware");
        assert_eq!(update.package_type, "file");
        assert_eq!(update.update_id, "u-1");
        assert_eq!(update.version, "1.2.3");
        assert_eq!(update.size, 4096);
        assert_eq!(update.md5.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
        assert_eq!(
            update.download_url.as_deref(),
            Some("https://cdn.backend.local/fw.bin")
        );
        assert_eq!(update.metadata.len(), 1);
        assert_eq!(update.metadata["release"], "stable");
    }

    #[test]
    fn non_file_update_is_partially_populated() {
        let raw = r#"{
            "updates": [{
                "updateType": "firmware",
                "packageType": "docker",
                "updateId": "u-2",
                "version": "2.0.0",
                "metadata": {}
            }]
        }"#;

        let updates = decode_update_list(raw).unwrap();

        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.update_type, "firmware");
        assert_eq!(update.package_type, "docker");
        assert_eq!(update.update_id, "u-2");
        assert_eq!(update.version, "2.0.0");
        assert_eq!(update.size, 0);
        assert_eq!(update.md5, None);
        assert_eq!(update.download_url, None);
    }

    #[test]
    fn decoding_continues_past_a_non_file_update() {
        let raw = format!(
            r#"{{
                "updates": [
                    {{
                        "updateType": "firmware",
                        "packageType": "docker",
                        "updateId": "u-2",
                        "version": "2.0.0",
                        "metadata": {{}}
                    }},
                    {}
                ]
            }}"#,
            file_update_json("u-3")
        );

        let updates = decode_update_list(&raw).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].download_url, None);
        assert_eq!(updates[1].update_id, "u-3");
        assert_eq!(updates[1].size, 4096);
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let raw = r#"{
            "updates": [{
                "updateType": "firmware",
                "packageType": "file",
                "updateId": "u-4",
                "metadata": {}
            }]
        }"#;

        let error = decode_update_list(raw).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unclassified);
        assert_eq!(error.code(), 500);
        assert!(error.description().contains("\"version\""));
    }

    #[test]
    fn missing_conditional_field_fails_for_file_packages() {
        let raw = r#"{
            "updates": [{
                "updateType": "firmware",
                "packageType": "file",
                "updateId": "u-5",
                "version": "1.0.0",
                "metadata": {},
                "size": 10,
                "md5": "abc"
            }]
        }"#;

        let error = decode_update_list(raw).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unclassified);
        assert!(error.description().contains("\"downloadUrl\""));
    }

    #[test]
    fn size_zero_is_accepted_but_negative_size_is_not() {
        let with_size = |size: &str| {
            format!(
                r#"{{
                    "updates": [{{
                        "updateType": "firmware",
                        "packageType": "file",
                        "updateId": "u-6",
                        "version": "1.0.0",
                        "metadata": {{}},
                        "size": {size},
                        "md5": "abc",
                        "downloadUrl": "https://cdn.backend.local/fw.bin"
                    }}]
                }}"#
            )
        };

        let updates = decode_update_list(&with_size("0")).unwrap();
        assert_eq!(updates[0].size, 0);

        let error = decode_update_list(&with_size("-1")).unwrap_err();
        assert!(error.description().contains("\"size\""));
    }

    #[test]
    fn metadata_must_be_an_object_of_strings() {
        let raw = r#"{
            "updates": [{
                "updateType": "firmware",
                "packageType": "docker",
                "updateId": "u-7",
                "version": "1.0.0",
                "metadata": { "release": 7 }
            }]
        }"#;

        let error = decode_update_list(raw).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unclassified);
        assert!(error.description().contains("metadata value is not a string"));
    }

    #[test]
    fn duplicate_metadata_keys_keep_the_last_value() {
        let raw = r#"{
            "updates": [{
                "updateType": "firmware",
                "packageType": "docker",
                "updateId": "u-8",
                "version": "1.0.0",
                "metadata": { "release": "first", "release": "second" }
            }]
        }"#;

        let updates = decode_update_list(raw).unwrap();

        assert_eq!(updates[0].metadata["release"], "second");
    }

    #[test]
    fn persisted_descriptors_keep_the_wire_field_names() {
        let raw = format!(r#"{{"updates": [{}]}}"#, file_update_json("u-9"));
        let decoded = &decode_update_list(&raw).unwrap()[0];

        let persisted = serde_json::to_value(decoded).unwrap();
        assert_eq!(persisted["updateType"], "firmware");
        assert_eq!(persisted["downloadUrl"], "https://cdn.backend.local/fw.bin");

        let reloaded: Update = serde_json::from_value(persisted).unwrap();
        assert_eq!(&reloaded, decoded);
    }

    #[test]
    fn descriptors_without_download_fields_reload_with_defaults() {
        let reloaded: Update = serde_json::from_str(
            r#"{
                "updateType": "firmware",
                "packageType": "docker",
                "updateId": "u-10",
                "version": "2.0.0",
                "metadata": {}
            }"#,
        )
        .unwrap();

        assert_eq!(reloaded.size, 0);
        assert_eq!(reloaded.md5, None);
        assert_eq!(reloaded.download_url, None);
    }

    #[test]
    fn malformed_documents_are_unclassified_errors() {
        for raw in [
            "not json",
            r#"[1, 2, 3]"#,
            r#"{"updates": {}}"#,
            r#"{"other": []}"#,
        ] {
            let error = decode_update_list(raw).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unclassified);
            assert_eq!(error.code(), 500);
        }
    }
}
