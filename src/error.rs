use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("Invalid pitch data: {0}")]
    InvalidPitchData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigFile(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
