use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a rule finding.
///
/// Identity fields:
/// - rule key
/// - data file path (repo-relative)
/// - finding name (if present)
/// - message
pub fn fingerprint_for_finding(
    rule_key: &str,
    data_path: &str,
    name: Option<&str>,
    message: &str,
) -> String {
    let canonical = [rule_key, data_path, name.unwrap_or(""), message].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
