use thiserror_no_std::Error;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Settings encoding failed: {0}")]
    Encode(postcard::Error),
    #[error("Settings decoding failed: {0}")]
    Decode(postcard::Error),
    #[error("Unsupported settings record version {0}")]
    UnsupportedVersion(u8),
    #[error("Field `{0}` does not fit its buffer")]
    FieldTooLong(&'static str),
    #[error("Settings store I/O failed")]
    Storage,
    #[error("OTA password rejected")]
    OtaRejected,
}
