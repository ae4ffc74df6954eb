pub type TextoverResult<T> = Result<T, TextoverError>;

#[derive(thiserror::Error, Debug)]
pub enum TextoverError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("no usable images: {0}")]
    EmptyImageDir(String),

    #[error("image decode error: {0}")]
    Decode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TextoverError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn empty_image_dir(msg: impl Into<String>) -> Self {
        Self::EmptyImageDir(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
