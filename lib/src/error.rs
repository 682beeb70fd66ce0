use std::{fmt, io};
use std::panic::Location;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The category of a failure.
///
/// Every kind is fatal to the operation that produced it: there are no
/// transient failures when reading a local site tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Malformed structured data or front-matter.
    Parse,
    /// A referenced file does not exist.
    FileNotFound,
    /// A leaf and a subtree were merged at the same key.
    AmbiguousPath,
    /// Any other I/O failure.
    Io,
    /// Template compilation or rendering failed.
    Template,
    /// Context added on top of a lower-level error, or anything else.
    Other,
}

#[derive(Debug, Clone)]
pub struct Error {
    kind: Kind,
    message: String,
    parameters: Vec<(Option<String>, String)>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

impl Error {
    #[track_caller]
    pub fn new<M: fmt::Display>(kind: Kind, message: M) -> Self {
        Error {
            kind,
            message: message.to_string(),
            parameters: vec![],
            prev: None,
            location: Location::caller(),
        }
    }

    pub fn with_param<K: fmt::Display, V: fmt::Display>(mut self, key: Option<K>, value: V) -> Self {
        self.parameters.push((key.map(|k| k.to_string()), value.to_string()));
        self
    }

    /// The first specific kind found walking from `self` down the chain of
    /// causes, or [`Kind::Other`] if there is none.
    pub fn kind(&self) -> Kind {
        let mut error = Some(self);
        while let Some(e) = error {
            if e.kind != Kind::Other {
                return e.kind;
            }

            error = e.prev.as_deref();
        }

        Kind::Other
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parameters(&self) -> &[(Option<String>, String)] {
        &self.parameters
    }

    pub fn cause(&self) -> Option<&Error> {
        self.prev.as_deref()
    }

    /// Places `self` at the bottom of `other`'s chain of causes.
    pub fn chain(self, mut other: Error) -> Self {
        fn _chain(error: Error, behind: &mut Error) {
            if let Some(prev) = behind.prev.as_mut() {
                _chain(error, prev);
            } else {
                behind.prev = Some(Box::new(error));
            }
        }

        _chain(self, &mut other);
        other
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Copy, Clone)] struct Indent(usize);

        impl fmt::Display for Indent {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for _ in 0..(self.0 * 4) { write!(f, " ")? }
                Ok(())
            }
        }

        struct NestedError<'a>(Indent, &'a Error);

        impl fmt::Display for NestedError<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let NestedError(indent, e) = self;
                let indent_line = format!("\n{indent}");

                writeln!(f, "{indent}{}", e.message.replace('\n', &indent_line))?;
                for (key, value) in &e.parameters {
                    let value = value.replace('\n', &indent_line);
                    match key {
                        Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                        None => writeln!(f, "{indent}{value}")?,
                    }
                }

                if std::env::var_os("RUST_BACKTRACE").is_some() {
                    writeln!(f, "{indent}[{}]", e.location)?;
                }

                if let Some(prev) = &e.prev {
                    NestedError(Indent(indent.0 + 1), prev).fmt(f)?;
                }

                Ok(())
            }
        }

        NestedError(Indent(0), self).fmt(f)
    }
}

impl From<io::Error> for Error {
    #[track_caller]
    fn from(error: io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => Kind::FileNotFound,
            _ => Kind::Io,
        };

        Error::new(kind, error)
    }
}

macro_rules! impl_from_parse_error {
    ($($T:ty),* $(,)?) => ($(
        impl From<$T> for Error {
            #[track_caller]
            fn from(error: $T) -> Self {
                Error::new(Kind::Parse, error)
            }
        }
    )*)
}

impl_from_parse_error!(serde_json::Error, serde_yaml::Error, toml::de::Error);

impl From<minijinja::Error> for Error {
    #[track_caller]
    fn from(error: minijinja::Error) -> Self {
        use std::error::Error as _;

        let mut e = Error::new(Kind::Template, &error);
        let mut source = error.source();
        while let Some(cause) = source {
            // An error raised by one of our own template functions.
            if let Some(inner) = cause.downcast_ref::<Error>() {
                let context = Error::new(Kind::Other, "template rendering failed")
                    .with_param(None::<&str>, &error);

                return inner.clone().chain(context);
            }

            e = e.with_param(None::<&str>, cause);
            source = cause.source();
        }

        e
    }
}

impl From<jwalk::Error> for Error {
    #[track_caller]
    fn from(error: jwalk::Error) -> Self {
        let path = error.path().map(|p| p.display().to_string());
        let e = Error::new(Kind::Io, "failed to walk directory");
        match path {
            Some(path) => e.with_param(Some("path"), path).with_param(None::<&str>, error),
            None => e.with_param(None::<&str>, error),
        }
    }
}

impl From<String> for Error {
    #[track_caller]
    fn from(message: String) -> Self {
        Error::new(Kind::Other, message)
    }
}

impl From<&str> for Error {
    #[track_caller]
    fn from(message: &str) -> Self {
        Error::new(Kind::Other, message)
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error).
///
/// ```rust
/// use trellis::error::Kind;
///
/// let e = trellis::error!(Parse: "bad header", "file" => "a.html", "line 3");
/// assert_eq!(e.kind(), Kind::Parse);
/// assert_eq!(e.parameters().len(), 2);
///
/// let e = trellis::error!("render failed");
/// assert_eq!(e.kind(), Kind::Other);
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v = $v.with_param(Some($key), $value);
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v = $v.with_param(None::<&str>, $value);
    };

    (@param $v:ident $(,)?) => { };

    ($kind:ident : $msg:expr $(, $($rest:tt)*)?) => ({
        #[allow(unused_mut)]
        let mut e = $crate::error::Error::new($crate::error::Kind::$kind, $msg);
        $($crate::error!(@param e $($rest)*);)?
        e
    });

    ($msg:expr $(, $($rest:tt)*)?) => ({
        #[allow(unused_mut)]
        let mut e = $crate::error::Error::new($crate::error::Kind::Other, $msg);
        $($crate::error!(@param e $($rest)*);)?
        e
    });
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(other.into()))
        }
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().chain(f().into()))
        }
    }
}
