
use kube::core::DynamicObject;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use serde_json::de::SliceRead;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Schema-less representation of a decoded manifest document.
pub type UnstructuredObject = DynamicObject;

#[derive(Debug)]
pub enum DecodeErrorKind {
    Yaml(serde_yml::Error),
    Json(serde_json::Error),
    /// The document parsed, but it is not a mapping of attributes
    NotAnObject,
    /// The document lacks `apiVersion` or `kind`
    MissingTypeMeta,
}

#[derive(Debug)]
pub struct DecodeError {
    /// Zero-based position of the failing document in the stream
    pub document: usize,
    pub kind: DecodeErrorKind,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DecodeErrorKind::Yaml(e) => write!(f, "Invalid YAML in document {}: {}", self.document, e),
            DecodeErrorKind::Json(e) => write!(f, "Invalid JSON in document {}: {}", self.document, e),
            DecodeErrorKind::NotAnObject => write!(f, "Document {} is not an object", self.document),
            DecodeErrorKind::MissingTypeMeta => {
                write!(f, "Document {} does not declare apiVersion and kind", self.document)
            }
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Yaml(e) => Some(e),
            DecodeErrorKind::Json(e) => Some(e),
            _ => None,
        }
    }
}

enum DocumentStream<'a> {
    Yaml(serde_yml::Deserializer<'a>),
    Parsed(std::vec::IntoIter<Value>),
    Json(serde_json::StreamDeserializer<'a, SliceRead<'a>, Value>),
    Exhausted,
}

/// Lazy sequence of the documents contained in a manifest buffer.
///
/// The buffer is a YAML stream separated by `---`, and each document may be written
/// in YAML or JSON syntax. A buffer starting with `{` that YAML cannot read is taken
/// as a stream of concatenated JSON values without separators.
/// Empty documents are skipped. The sequence ends at the end of input, or right
/// after the first error.
pub struct ManifestDecoder<'a> {
    stream: DocumentStream<'a>,
    document: usize,
}

pub fn decode(bytes: &[u8]) -> ManifestDecoder<'_> {
    let is_json = bytes
        .iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|byte| *byte == b'{');
    if !is_json {
        return ManifestDecoder {
            stream: DocumentStream::Yaml(serde_yml::Deserializer::from_slice(bytes)),
            document: 0,
        };
    }

    // A JSON-leading buffer is read whole as YAML first to pick the syntax
    let stream = match read_yaml_documents(bytes) {
        Ok(values) => DocumentStream::Parsed(values.into_iter()),
        Err(e) => {
            debug!("Reading manifest as concatenated JSON values, it is not a YAML stream: {}", e);
            DocumentStream::Json(serde_json::Deserializer::from_slice(bytes).into_iter())
        }
    };
    ManifestDecoder { stream, document: 0 }
}

fn read_yaml_documents(bytes: &[u8]) -> Result<Vec<Value>, serde_yml::Error> {
    serde_yml::Deserializer::from_slice(bytes).map(Value::deserialize).collect()
}

/// Decodes every document of `bytes`, failing on the first invalid one.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<UnstructuredObject>, DecodeError> {
    decode(bytes).collect()
}

impl ManifestDecoder<'_> {
    fn next_value(&mut self) -> Option<Result<Value, DecodeErrorKind>> {
        match &mut self.stream {
            DocumentStream::Yaml(documents) => {
                let document = documents.next()?;
                Some(Value::deserialize(document).map_err(DecodeErrorKind::Yaml))
            }
            DocumentStream::Parsed(values) => values.next().map(Ok),
            DocumentStream::Json(values) => Some(values.next()?.map_err(DecodeErrorKind::Json)),
            DocumentStream::Exhausted => None,
        }
    }

    fn fail(&mut self, kind: DecodeErrorKind) -> DecodeError {
        self.stream = DocumentStream::Exhausted;
        DecodeError {
            document: self.document,
            kind,
        }
    }
}

impl Iterator for ManifestDecoder<'_> {
    type Item = Result<UnstructuredObject, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let value = match self.next_value()? {
                Ok(value) => value,
                Err(kind) => return Some(Err(self.fail(kind))),
            };
            if value.is_null() {
                self.document += 1;
                continue;
            }
            let result = to_unstructured(value).map_err(|kind| self.fail(kind));
            self.document += 1;
            return Some(result);
        }
    }
}

fn to_unstructured(value: Value) -> Result<UnstructuredObject, DecodeErrorKind> {
    let Value::Object(mut attributes) = value else {
        return Err(DecodeErrorKind::NotAnObject);
    };
    let declares_type = ["apiVersion", "kind"]
        .iter()
        .all(|key| attributes.get(*key).and_then(Value::as_str).is_some_and(|value| !value.is_empty()));
    if !declares_type {
        return Err(DecodeErrorKind::MissingTypeMeta);
    }
    attributes
        .entry("metadata")
        .or_insert_with(|| Value::Object(Default::default()));
    serde_json::from_value(Value::Object(attributes)).map_err(DecodeErrorKind::Json)
}
