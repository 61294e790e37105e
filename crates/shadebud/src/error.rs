use std::io;

/// Errors from loading configuration or environment maps and writing baked
/// output.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::error::ImageError),

    #[error("invalid arguments: {0}")]
    Args(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn read_missing() -> Result<String> {
        Ok(std::fs::read_to_string("/nonexistent/shadebud/ibl.json")?)
    }

    #[test]
    fn io_errors_convert() {
        assert!(matches!(read_missing(), Err(Error::Io(_))));
    }

    #[test]
    fn args_error_message() {
        let err = Error::Args("--out needs a directory".to_string());
        assert_eq!(err.to_string(), "invalid arguments: --out needs a directory");
    }
}
