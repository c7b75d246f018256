use crate::services::backends::kubernetes::manifest_decoder::DecodeError;
use kube::core::GroupVersionKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Replace,
}

/// Errors aborting an apply call. The first one encountered is returned to the caller.
#[derive(Debug)]
pub enum ApplyError {
    /// The discovery document could not be fetched
    Discovery(kube::Error),
    Io { path: PathBuf, source: std::io::Error },
    Decode(DecodeError),
    KindNotFound(GroupVersionKind),
    MissingMetadata { kind: String, field: &'static str },
    /// The existence check failed for another reason than the object being absent
    Read { name: String, source: kube::Error },
    Write {
        operation: WriteOperation,
        name: String,
        source: kube::Error,
    },
}

impl ApplyError {
    pub fn is_kind_not_found(&self) -> bool {
        matches!(self, ApplyError::KindNotFound(_))
    }
}

impl From<DecodeError> for ApplyError {
    fn from(error: DecodeError) -> Self {
        ApplyError::Decode(error)
    }
}

impl Display for ApplyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyError::Discovery(e) => write!(f, "API discovery failed: {}", e),
            ApplyError::Io { path, source } => write!(f, "Failed to read manifest {:?}: {}", path, source),
            ApplyError::Decode(e) => write!(f, "Failed to decode manifest: {}", e),
            ApplyError::KindNotFound(gvk) => write!(
                f,
                "Kind not found: no resource for kind '{}' in group '{}' version '{}'",
                gvk.kind, gvk.group, gvk.version
            ),
            ApplyError::MissingMetadata { kind, field } => {
                write!(f, "Failed to read metadata.{} of a {} object", field, kind)
            }
            ApplyError::Read { name, source } => write!(f, "Failed to read resource {}: {}", name, source),
            ApplyError::Write { operation, name, source } => {
                write!(f, "Failed to {:?} resource {}: {}", operation, name, source)
            }
        }
    }
}

impl Error for ApplyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApplyError::Discovery(e) => Some(e),
            ApplyError::Io { source, .. } => Some(source),
            ApplyError::Decode(e) => Some(e),
            ApplyError::Read { source, .. } => Some(source),
            ApplyError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}
