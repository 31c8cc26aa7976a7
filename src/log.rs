//! Thin wrappers around `tracing` that compile away without `with_tracing`.

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        tracing::debug!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        tracing::info!($($arg)*);
    }};
}

macro_rules! warning {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        tracing::warn!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "with_tracing")]
        tracing::error!($($arg)*);
    }};
}

pub(crate) use {debug, error, info, warning};
