use thiserror::Error;

/// Failure talking to the destination catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl CatalogError {
    /// True for failures worth retrying later (rate limiting, server errors, network).
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Status { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            CatalogError::Transport { .. } => true,
            CatalogError::Decode { .. } => false,
        }
    }
}

/// Failure that aborts the resolution of a single source track.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("catalog search failed for query '{query}': {source}")]
    Search {
        query: String,
        #[source]
        source: CatalogError,
    },

    #[error("favorites check failed for track {track_id}: {source}")]
    FavoritesCheck {
        track_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("adding track {track_id} to favorites failed: {source}")]
    FavoritesAdd {
        track_id: String,
        #[source]
        source: CatalogError,
    },
}

impl ReconcileError {
    pub fn catalog_error(&self) -> &CatalogError {
        match self {
            ReconcileError::Search { source, .. }
            | ReconcileError::FavoritesCheck { source, .. }
            | ReconcileError::FavoritesAdd { source, .. } => source,
        }
    }
}
