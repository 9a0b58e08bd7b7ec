//! Error construction macros.

/// Builds an [`crate::error::EtlError`] from a kind and a static description.
///
/// The optional third argument is rendered with `to_string` as the error detail. An originating
/// error is attached with a trailing `source:`.
///
/// ```ignore
/// etl_error!(ErrorKind::MissingColumn, "Column not found", format!("`{name}`"));
/// etl_error!(ErrorKind::SessionQueryFailed, "DuckDB statement failed", source: err);
/// ```
#[macro_export]
macro_rules! etl_error {
    ($kind:expr, $desc:expr $(, source: $source:expr)?) => {
        $crate::error::EtlError::from(($kind, $desc))
            $(.with_source($source))?
    };
    ($kind:expr, $desc:expr, $detail:expr $(, source: $source:expr)?) => {
        $crate::error::EtlError::from(($kind, $desc, $detail.to_string()))
            $(.with_source($source))?
    };
}

/// Returns early with an [`crate::error::EtlError`] built by [`etl_error!`].
#[macro_export]
macro_rules! bail {
    ($($args:tt)+) => {
        return ::core::result::Result::Err($crate::etl_error!($($args)+))
    };
}
