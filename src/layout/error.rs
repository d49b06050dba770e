#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SankeyError {
    #[error("missing: {id}")]
    UnresolvedReference { id: String },
    #[error("missing: node index {index} (graph has {len} nodes)")]
    NodeIndexOutOfRange { index: usize, len: usize },
    #[error("invalid extent [[{x0}, {y0}], [{x1}, {y1}]]")]
    InvalidExtent { x0: f64, y0: f64, x1: f64, y1: f64 },
    #[error("invalid node width {width}")]
    InvalidNodeWidth { width: f64 },
}

pub type SankeyResult<T> = Result<T, SankeyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_reference_names_the_id() {
        let err = SankeyError::UnresolvedReference {
            id: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "missing: ghost");
    }
}
