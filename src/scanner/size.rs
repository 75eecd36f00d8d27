//! Human-readable size rendering.
//!
//! Sizes are scaled by powers of 1000 over a fixed unit table
//! (B, KB, MB, GB, TB, PB, EB, ZB, YB). The scaled value is printed with
//! its shortest decimal representation and cut to at most
//! [`MAX_VALUE_CHARS`] characters, so `1000` renders as `"1 KB"` and
//! `999_999` as `"999.999 KB"`.
//!
//! # Example
//!
//! ```
//! use hashdiff::scanner::size::human_size;
//!
//! assert_eq!(human_size(0), "0 B");
//! assert_eq!(human_size(1_500_000), "1.5 MB");
//! ```

/// Unit suffixes, smallest first.
pub const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Rendered instead of a size when the value does not fit the unit table.
pub const SIZE_TOO_LARGE: &str = "Filesize too big...";

/// Maximum number of characters kept from the numeric part.
pub const MAX_VALUE_CHARS: usize = 8;

const STEP: f64 = 1000.0;

/// Render a byte count as a human-readable string.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    scale(bytes as f64)
}

/// Render an arbitrary non-negative byte quantity.
///
/// Returns [`SIZE_TOO_LARGE`] when the value would need a unit past `YB`.
#[must_use]
pub fn scale(value: f64) -> String {
    let mut value = value;
    let mut unit = 0;

    while value >= STEP {
        value /= STEP;
        unit += 1;
        if unit >= UNITS.len() {
            return SIZE_TOO_LARGE.to_string();
        }
    }

    let mut rendered = value.to_string();
    rendered.truncate(MAX_VALUE_CHARS);
    format!("{} {}", rendered, UNITS[unit])
}
