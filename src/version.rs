const fn unwrap_or_cargo_version(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Build version, taken from `APP_VERSION` at compile time when the release
/// pipeline sets it.
pub const VERSION: &str = unwrap_or_cargo_version(option_env!("APP_VERSION"));

/// `User-Agent` sent with every outbound webhook call.
pub fn user_agent() -> String {
    format!("notify-relay/{VERSION}")
}
