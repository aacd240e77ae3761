use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtyrecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record payload truncated: header declared {declared} bytes but only {got} remained")]
    ShortRead { declared: u32, got: usize },

    #[error("record payload length {declared} exceeds the {max} byte maximum")]
    PayloadTooLarge { declared: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, TtyrecError>;
