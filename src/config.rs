/// Application-level constants
pub const APP_NAME: &str = "Liftplan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "liftplan_lib=debug,info"
    } else {
        "liftplan_lib=info,warn"
    }
}
