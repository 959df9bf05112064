use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The container holds no decodable audio track.
    #[error("Aucune piste audio dans {0}")]
    NoAudioTrack(String),

    /// Decoding finished without producing a single sample.
    #[error("Aucun échantillon décodé depuis {0}")]
    EmptyStream(String),

    /// Signal too short for a single analysis frame.
    #[error("Signal trop court : {samples} échantillons, {frame_size} requis")]
    TooShort {
        /// Samples available.
        samples: usize,
        /// Samples needed for one frame.
        frame_size: usize,
    },
}
