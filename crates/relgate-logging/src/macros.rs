//! ---
//! rg_section: "03-logging"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Structured logging adapters and sinks."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
//! Logging macros that stamp every event with the scenario context.

#[doc(hidden)]
#[macro_export]
macro_rules! __rg_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            variant = ctx.variant.unwrap_or(""),
            prior = ctx.prior.unwrap_or(f64::NAN),
            endpoint = ctx.endpoint.unwrap_or(""),
            stage = ctx.stage.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with scenario context.
#[macro_export]
macro_rules! rg_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with scenario context.
#[macro_export]
macro_rules! rg_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with scenario context.
#[macro_export]
macro_rules! rg_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rg_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}
