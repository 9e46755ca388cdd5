use secrecy::{ExposeSecret, Secret};

/// Checks the token a caller presented against the job secret.
///
/// A missing token never matches. The comparison does not short-circuit on the
/// first differing byte.
pub fn is_authorized(candidate: Option<&str>, secret: &Secret<String>) -> bool {
    match candidate {
        Some(candidate) => {
            constant_time_compare(candidate.as_bytes(), secret.expose_secret().as_bytes())
        }
        None => false,
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
