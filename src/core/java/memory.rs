use sysinfo::System;
use tracing::debug;

/// Upper bound offered for the heap, whatever the machine has.
pub const MAX_MEMORY_CEILING_MB: u64 = 65536;

/// Physical memory in MiB, capped at [`MAX_MEMORY_CEILING_MB`]. `0` when
/// the platform does not report it.
pub fn memory_ceiling_mb() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    let total_mb = system.total_memory() / (1024 * 1024);
    debug!("Physical memory: {} MiB", total_mb);
    total_mb.min(MAX_MEMORY_CEILING_MB)
}

/// JVM heap size string to MiB: `4096M`, `4G`, `524288k`, or plain bytes.
pub fn parse_memory_mb(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], Some(c.to_ascii_lowercase())),
        _ => (value, None),
    };
    let amount: u64 = digits.parse().ok()?;

    match unit {
        None => Some(amount / (1024 * 1024)),
        Some('k') => Some(amount / 1024),
        Some('m') => Some(amount),
        Some('g') => amount.checked_mul(1024),
        Some('t') => amount.checked_mul(1024 * 1024),
        Some(_) => None,
    }
}

pub fn format_memory_mb(mb: u64) -> String {
    format!("{mb}M")
}

/// `value` limited to `ceiling_mb`. Unparseable values pass through, and a
/// zero ceiling means unknown, so nothing is clamped.
pub fn clamp_memory(value: &str, ceiling_mb: u64) -> String {
    match parse_memory_mb(value) {
        Some(mb) if ceiling_mb > 0 && mb > ceiling_mb => format_memory_mb(ceiling_mb),
        _ => value.to_string(),
    }
}
