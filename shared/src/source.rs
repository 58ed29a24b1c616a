use std::future::Future;

use crate::region::GeometryCollection;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Asynchronous provider of the region geometry, loaded once at startup.
pub trait GeometrySource {
    fn load(&self) -> impl Future<Output = Result<GeometryCollection, GeometryError>>;
}

/// Parse a GeoJSON `FeatureCollection` document.
pub fn parse_collection(bytes: &[u8]) -> Result<GeometryCollection, GeometryError> {
    serde_json::from_slice(bytes).map_err(|e| GeometryError::Parse(e.to_string()))
}

/// Source backed by a document already in memory.
#[derive(Debug, Clone)]
pub struct StaticGeometrySource {
    document: Vec<u8>,
}

impl StaticGeometrySource {
    pub fn new(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl GeometrySource for StaticGeometrySource {
    fn load(&self) -> impl Future<Output = Result<GeometryCollection, GeometryError>> {
        std::future::ready(parse_collection(&self.document))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn static_source_parses_document() {
        let source = StaticGeometrySource::new(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"01001","properties":{},"geometry":null}]}"#,
        );
        let collection = block_on(source.load()).expect("load collection");
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let source = StaticGeometrySource::new("<html>rate limited</html>");
        let err = block_on(source.load()).expect_err("invalid json");
        assert!(matches!(err, GeometryError::Parse(_)));
        assert!(err.to_string().starts_with("parse error:"));
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(GeometryError::Status(503).to_string(), "HTTP 503");
        assert_eq!(
            GeometryError::Fetch("connection refused".into()).to_string(),
            "fetch error: connection refused"
        );
    }
}
