// Audio decoding and onset / tempo / beat feature extraction for tempomatch.

pub mod beat;
pub mod decode;
pub mod error;
pub mod fft;
pub mod onset;
pub mod provider;
pub mod tempo;

pub use error::AudioError;
pub use provider::SpectralProvider;
