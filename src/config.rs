//! Recognized service options.

/// Tuning options of the service handler.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Capacity in bytes of each of the two per-connection content
    /// buffers. Bounds per-connection memory at twice this value.
    pub content_buffer_size: usize,
}

impl ServiceConfig {
    pub const DEFAULT_CONTENT_BUFFER_SIZE: usize = 20480;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_buffer_size(mut self, size: usize) -> Self {
        self.content_buffer_size = size;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { content_buffer_size: Self::DEFAULT_CONTENT_BUFFER_SIZE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buffer_size() {
        assert_eq!(ServiceConfig::new().content_buffer_size, 20480);
        assert_eq!(ServiceConfig::new().content_buffer_size(64).content_buffer_size, 64);
    }
}
