use std::fmt;

/// Errors raised at scene-build, asset-load, and output-write boundaries.
/// The render hot path (BVH traversal, shading, integration, dispatch)
/// never returns this — it stays infallible all the way down.
#[derive(Debug)]
pub enum RenderError {
    SceneLoad(String),
    ImageDecode(String),
    ImageEncode(std::io::Error),
    ObjParse(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SceneLoad(msg) => write!(f, "scene construction error: {msg}"),
            RenderError::ImageDecode(msg) => write!(f, "image decode error: {msg}"),
            RenderError::ImageEncode(err) => write!(f, "image encode error: {err}"),
            RenderError::ObjParse(msg) => write!(f, "obj parse error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::ImageEncode(err)
    }
}
