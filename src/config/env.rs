use std::str::FromStr;

pub fn addr() -> String {
    std::env::var("addr").expect("Not Find addr to bind")
}

pub fn get_key(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("NO SUCH KEY {} in env", key))
}

pub fn get_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Reads `key` and parses it, falling back to `default` when the key is
/// missing or malformed.
pub fn get_or<T: FromStr>(key: &str, default: T) -> T {
    match get_opt(key) {
        Some(v) => v.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "malformed env value, using default");
            default
        }),
        None => default,
    }
}
