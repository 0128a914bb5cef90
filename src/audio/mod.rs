pub mod backend;
pub mod encoder;
pub mod file;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use encoder::WavEncoder;
pub use file::{AudioFile, FileBackend};
