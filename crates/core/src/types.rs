/// Backend record identifiers are integer primary keys.
pub type DbId = i64;

/// Discrete simulation time unit used by every series and window.
pub type Tick = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
