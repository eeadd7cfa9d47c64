use thiserror::Error;

/// Errors from the data loader. Either the transport layer failed or the
/// payload could not be shaped into an hourly table; in both cases the
/// original cause is carried and no partial data is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Transport failure or a non-success HTTP status from the API.
    #[error("error fetching data from API: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Malformed response body, a missing `records` field, or an
    /// unparseable hour key.
    #[error("error processing data: {0}")]
    Processing(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Processing(Box::new(e))
    }
}

impl From<chrono::ParseError> for LoadError {
    fn from(e: chrono::ParseError) -> Self {
        Self::Processing(Box::new(e))
    }
}

/// Errors from the plot renderer. Unknown colors, labels and scale keys are
/// handled permissively and never end up here.
#[derive(Debug, Error)]
pub enum PlotError {
    /// A column requested for stacking (or the load overlay) is not present
    /// in the table. Supplying valid column names is the caller's job.
    #[error("column not present in table: {0}")]
    MissingColumn(String),

    /// The [start, end] window left no rows to draw.
    #[error("no rows within the requested plot window")]
    EmptyRange,

    /// The drawing backend rejected an operation.
    #[error("drawing backend error: {0}")]
    Backend(String),
}
