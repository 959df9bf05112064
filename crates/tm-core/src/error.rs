use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// A tempo profile was requested from an empty estimate set.
    #[error("Aucune estimation de tempo : impossible de construire un profil")]
    EmptyEstimates,

    /// One of the ensemble estimates is NaN or infinite.
    #[error("Estimation de tempo non finie (méthode {index}) : {value}")]
    NonFiniteEstimate {
        /// Position of the estimate in the ensemble order.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Decoded signal cannot be analysed.
    #[error("Signal invalide : {0}")]
    InvalidSignal(String),
}
