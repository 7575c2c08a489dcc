//! `anyhow`-style context extension traits for `Result`/`Option`, scoped to
//! the ambient/CLI layers. The storage core returns plain `BeadsError`
//! directly and should not need these.

use super::BeadsError;

/// Adds `.context()`/`.with_context()` to any `Result<T, E>` whose error
/// implements `std::error::Error + Send + Sync + 'static`, wrapping it in
/// `BeadsError::WithContext`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, BeadsError>;
    fn with_context<F, S>(self, f: F) -> Result<T, BeadsError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T, BeadsError> {
        self.map_err(|source| BeadsError::WithContext {
            context: context.into(),
            source: Box::new(source),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T, BeadsError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| BeadsError::WithContext {
            context: f().into(),
            source: Box::new(source),
        })
    }
}

/// Adds `.context()`/`.with_context()` to `Option<T>`, turning `None` into a
/// `BeadsError::Other` carrying the given message.
pub trait OptionExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, BeadsError>;
    fn with_context<F, S>(self, f: F) -> Result<T, BeadsError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, context: impl Into<String>) -> Result<T, BeadsError> {
        self.ok_or_else(|| BeadsError::Other(anyhow::anyhow!(context.into())))
    }

    fn with_context<F, S>(self, f: F) -> Result<T, BeadsError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.ok_or_else(|| BeadsError::Other(anyhow::anyhow!(f().into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_context_wraps_error() {
        let res: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
        let wrapped = res.context("reading snapshot");
        assert!(matches!(wrapped, Err(BeadsError::WithContext { .. })));
    }

    #[test]
    fn option_context_on_none() {
        let opt: Option<u32> = None;
        let wrapped = opt.context("missing value");
        assert!(wrapped.is_err());
    }

    #[test]
    fn option_context_on_some_passes_through() {
        let opt = Some(5);
        assert_eq!(opt.context("unused").unwrap(), 5);
    }
}
