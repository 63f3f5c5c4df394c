use anyhow::Result;

use crate::{Device, ModelArtifact, ModelSpec};

pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    /// Lower-case file extensions this backend reads, without the dot.
    fn extensions(&self) -> &'static [&'static str];
    fn load(&self, artifact: &ModelArtifact, device: Device) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    fn spec(&self) -> &ModelSpec;
}
