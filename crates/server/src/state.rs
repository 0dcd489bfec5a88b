use std::sync::Arc;

use anyhow::Context;

use crate::config::ServerConfig;

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Raw bytes of the fixed reference image, loaded once from the
    /// configured path. Decoded per comparison; shared read-only across
    /// connection threads.
    pub reference_image: Arc<Vec<u8>>,
}

impl ServerState {
    /// Create new server state, loading the reference image.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let reference_image = std::fs::read(&config.reference_image_path).with_context(|| {
            format!(
                "failed to read reference image {}",
                config.reference_image_path.display()
            )
        })?;
        tracing::info!(
            path = %config.reference_image_path.display(),
            bytes = reference_image.len(),
            "reference image loaded"
        );

        Ok(Self {
            config: Arc::new(config),
            reference_image: Arc::new(reference_image),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_reference_image_fails_startup() {
        let config = ServerConfig {
            reference_image_path: "/nonexistent/reference.png".into(),
            ..Default::default()
        };
        assert!(ServerState::new(config).is_err());
    }

    #[test]
    fn reference_image_bytes_are_loaded_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reference.png");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"\x89PNG not really").expect("write");

        let config = ServerConfig {
            reference_image_path: path,
            ..Default::default()
        };
        let state = ServerState::new(config).expect("state");
        assert_eq!(state.reference_image.as_slice(), b"\x89PNG not really");
    }
}
