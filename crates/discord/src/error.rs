use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("discord returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited by discord after {attempts} attempts (retry after {retry_after_secs:.1}s)")]
    RateLimited {
        attempts: u32,
        retry_after_secs: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
