use crate::error::Result;

/// Turns an [`Error`](crate::Error) into a panic at the call site.
///
/// The panic payload is the `Error` itself, so it can be recovered with
/// `std::panic::catch_unwind` and `downcast`.
///
/// ```should_panic
/// use sqlx_dbutils::{Error, OrPanic};
///
/// let result: Result<(), Error> = Err(Error::NoColumns("users".into()));
/// result.or_panic();
/// ```
pub trait OrPanic<T> {
    fn or_panic(self) -> T;
}

impl<T> OrPanic<T> for Result<T> {
    #[track_caller]
    fn or_panic(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => std::panic::panic_any(err),
        }
    }
}
