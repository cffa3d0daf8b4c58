use thiserror::Error;

/// Rejections reported by the checked (`try_`) operations.
///
/// The unchecked operations turn every rejection into a no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

impl MirrorError {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        MirrorError::IndexOutOfRange { index, len }
    }
}
