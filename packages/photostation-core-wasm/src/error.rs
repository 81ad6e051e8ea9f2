use thiserror::Error;
use wasm_bindgen::JsValue;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Everything that can go wrong between the API fetch and a built scene.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// A payload did not match the expected schema.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// `geomjson.type` named a kind the viewer cannot draw.
    #[error("unknown geometry kind '{0}'")]
    UnknownGeometryKind(String),
    /// The record decoded but cannot describe a drawable shape.
    #[error("invalid geometry record: {0}")]
    InvalidGeometry(String),
    /// The 2D boundary could not be triangulated.
    #[error("triangulation failed: {0}")]
    Triangulation(String),
    #[error("request to {url} failed with HTTP status {status}")]
    Http { url: String, status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid viewer configuration: {0}")]
    Config(String),
}

impl ViewerError {
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        ViewerError::Decode {
            context: context.into(),
            source,
        }
    }

    /// Record-level errors are skipped by the projector; everything else
    /// aborts the scene build.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            ViewerError::UnknownGeometryKind(_)
                | ViewerError::InvalidGeometry(_)
                | ViewerError::Triangulation(_)
        )
    }
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
