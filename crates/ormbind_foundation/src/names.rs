//! Helpers for dotted class and property names.

/// Returns the part of a dotted name after the last `.`.
///
/// ```
/// use ormbind_foundation::names::unqualify;
/// assert_eq!(unqualify("com.acme.Order"), "Order");
/// assert_eq!(unqualify("Order"), "Order");
/// ```
#[must_use]
pub fn unqualify(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(pos) => &qualified[pos + 1..],
        None => qualified,
    }
}

/// Joins a prefix and a name with `.`; an empty prefix yields the name alone.
#[must_use]
pub fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Treats blank strings the same as absent values.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Returns `true` if the value is absent or blank.
#[must_use]
pub fn is_blank(value: Option<&str>) -> bool {
    non_blank(value).is_none()
}

/// Computes the 32-bit string hash used by JVM-hosted mappings.
///
/// The hash is `s[0]*31^(n-1) + ... + s[n-1]` over UTF-16 code units with
/// wrapping arithmetic, which keeps integer discriminator defaults stable
/// across implementations.
#[must_use]
pub fn java_string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}
