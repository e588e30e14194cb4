//! Objects built from a configuration.
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    ///
    /// Invalid configurations are rejected here rather than at the first use.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Builds the object with the configuration in the YAML file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path.as_ref())?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        log::info!("Build from config file {:?}", path.as_ref());
        Self::build(config)
    }
}
