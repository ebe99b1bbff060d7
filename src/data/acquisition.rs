//! The current acquisition set and the operations that replace it.

use dso_core::{AcquisitionSet, DecodeError};
use std::path::Path;

/// Holds the most recent capture or load. A failed operation leaves the
/// previous set in place.
#[derive(Debug, Default)]
pub struct AcquisitionStore {
    current: Option<AcquisitionSet>,
}

impl AcquisitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&AcquisitionSet> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Replace the current set with the result of `op`, only if it succeeds
    /// and the new set is valid.
    pub fn replace_with<E, F>(&mut self, op: F) -> Result<&AcquisitionSet, E>
    where
        F: FnOnce() -> Result<AcquisitionSet, E>,
        E: From<DecodeError>,
    {
        let set = op()?;
        set.validate()?;
        Ok(&*self.current.insert(set))
    }

    pub fn load(&mut self, path: &Path) -> Result<&AcquisitionSet, DecodeError> {
        self.replace_with(|| dso_file::load_file(path))
    }

    pub fn save(&self, path: &Path) -> Result<(), DecodeError> {
        let set = self.current.as_ref().ok_or(DecodeError::NoChannels)?;
        dso_file::save_file(path, set)
    }
}
