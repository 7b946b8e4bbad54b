/// The default file to which log records are appended
pub(crate) static DEFAULT_LOG_FILE: &str = "s3intrestore.log";
