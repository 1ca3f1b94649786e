/// Opaque job identifier assigned by the generation provider.
///
/// Never generated locally; whatever the provider returns is accepted as-is.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
