// src/identifier.rs

//! Package locator (purl) and platform identifier (CPE 2.3) builders.
//!
//! Both are pure functions of their inputs; ecosystem strategies pick the
//! ecosystem token and qualifier keys.

/// Build a package-url style locator.
///
/// Shape: `pkg:<ecosystem>/[namespace/]<name>@<version>[?key=value&...]`.
/// Version strings pass through verbatim; qualifiers with empty values are
/// dropped.
pub fn purl(
    ecosystem: &str,
    namespace: Option<&str>,
    name: &str,
    version: &str,
    qualifiers: &[(&str, String)],
) -> String {
    let mut out = format!("pkg:{}/", ecosystem);
    if let Some(namespace) = namespace {
        out.push_str(namespace);
        out.push('/');
    }
    out.push_str(name);
    out.push('@');
    out.push_str(version);

    let mut first = true;
    for (key, value) in qualifiers {
        if value.is_empty() {
            continue;
        }
        out.push(if first { '?' } else { '&' });
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        first = false;
    }

    out
}

/// Build a CPE 2.3 platform identifier.
///
/// Thirteen colon-delimited fields with `*` padding for the unused ones.
/// Colon is the field separator, so a literal colon inside the version is
/// escaped with a backslash. The vendor is lower-cased with spaces
/// replaced by underscores.
pub fn cpe(vendor: &str, product: &str, version: &str) -> String {
    let vendor = vendor.trim().to_lowercase().replace(' ', "_");
    let version = version.replace(':', "\\:");
    format!("cpe:2.3:a:{}:{}:{}:*:*:*:*:*:*:*", vendor, product, version)
}
