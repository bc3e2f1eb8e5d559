//! Multi-document manifest decoding.
//!
//! Input is YAML with documents separated by `---` (JSON documents are valid
//! YAML). Each non-empty document becomes an [`AddressedResource`], in source
//! order.

use crate::error::{Error, Result};
use crate::types::AddressedResource;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Decode raw multi-document text into addressed resources.
///
/// Documents that are empty, or that carry neither `apiVersion` nor `kind`,
/// are skipped. A document with only one of the two fails the whole decode.
pub fn decode(text: &str) -> Result<Vec<AddressedResource>> {
    if text.trim().is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut resources = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(document)
            .map_err(|e| Error::malformed(index, format!("invalid YAML: {e}")))?;

        if is_empty_document(&value) {
            continue;
        }

        if let Some(resource) = AddressedResource::from_document(index, value)? {
            resources.push(resource);
        }
    }

    log::debug!("Decoded {} resource(s)", resources.len());

    if resources.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(resources)
}

/// Read and decode a manifest file.
pub fn decode_file(path: &Path) -> Result<Vec<AddressedResource>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    decode(&text)
}

/// Render resources as multi-document YAML that [`decode`] reads back unchanged.
pub fn encode(resources: &[AddressedResource]) -> Result<String> {
    let mut out = String::new();
    for (index, resource) in resources.iter().enumerate() {
        let yaml = serde_yaml::to_string(resource.document())
            .map_err(|e| Error::malformed(index, format!("cannot render as YAML: {e}")))?;
        out.push_str("---\n");
        out.push_str(&yaml);
    }
    Ok(out)
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_multi_document() {
        let text = r#"
apiVersion: v1
kind: Namespace
metadata:
  name: demo
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: demo
spec:
  replicas: 2
"#;
        let resources = decode(text).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].kind(), "Namespace");
        assert_eq!(resources[0].group(), "");
        assert_eq!(resources[0].version(), "v1");
        assert_eq!(resources[1].kind(), "Deployment");
        assert_eq!(resources[1].group(), "apps");
        assert_eq!(resources[1].namespace(), "demo");
        assert_eq!(resources[1].document()["spec"]["replicas"], 2);
    }

    #[test]
    fn test_decode_skips_empty_documents() {
        let text = "---\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n---\n";
        let resources = decode(text).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name(), "s");
    }

    #[test]
    fn test_decode_skips_documents_without_type() {
        let text = "metadata:\n  name: orphan\n---\napiVersion: v1\nkind: Pod\nmetadata:\n  name: p\n";
        let resources = decode(text).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].kind(), "Pod");
    }

    #[test]
    fn test_decode_kind_without_api_version() {
        let text = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\n---\nkind: Widget\nmetadata:\n  name: w\n";
        let err = decode(text).unwrap_err();
        assert!(matches!(err, Error::MalformedResource { index: 1, .. }));
    }

    #[test]
    fn test_decode_api_version_without_kind() {
        let err = decode("apiVersion: example.io/v1\nmetadata:\n  name: w\n").unwrap_err();
        assert!(matches!(err, Error::MalformedResource { index: 0, .. }));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(decode(""), Err(Error::EmptyInput)));
        assert!(matches!(decode("---\n---\n"), Err(Error::EmptyInput)));
        assert!(matches!(
            decode("metadata:\n  name: x\n"),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_decode_invalid_yaml() {
        let err = decode("apiVersion: v1\nkind: [unclosed\n").unwrap_err();
        assert!(matches!(err, Error::MalformedResource { .. }));
    }

    #[test]
    fn test_decode_json_document() {
        let text = r#"{"apiVersion": "example.io/v1", "kind": "Widget", "metadata": {"name": "w1"}}"#;
        let resources = decode(text).unwrap();
        assert_eq!(resources[0].group(), "example.io");
        assert_eq!(resources[0].name(), "w1");
    }

    #[test]
    fn test_decode_preserves_order() {
        let text = (0..5)
            .map(|i| format!("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm-{i}\n"))
            .collect::<Vec<_>>()
            .join("---\n");
        let resources = decode(&text).unwrap();
        let names: Vec<_> = resources.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["cm-0", "cm-1", "cm-2", "cm-3", "cm-4"]);
    }

    #[test]
    fn test_round_trip() {
        let text = r#"
apiVersion: example.io/v1
kind: Widget
metadata:
  name: w1
  labels:
    tier: gold
spec:
  size: 3
  tags: [a, b]
  enabled: true
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: demo
data:
  key: "value with: colon"
"#;
        let resources = decode(text).unwrap();
        let encoded = encode(&resources).unwrap();
        assert_eq!(decode(&encoded).unwrap(), resources);
    }

    #[test]
    fn test_decode_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apiVersion: v1\nkind: Secret\nmetadata:\n  name: creds").unwrap();

        let resources = decode_file(file.path()).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].kind(), "Secret");
    }

    #[test]
    fn test_decode_file_missing() {
        let err = decode_file(Path::new("/nonexistent/manifests.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
