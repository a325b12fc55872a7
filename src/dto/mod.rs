pub mod addresses;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod logs;
pub mod orders;
pub mod products;
pub mod users;

use serde::{Deserialize, Deserializer};

/// `local@domain.tld` with no whitespace; deliverability is not checked.
pub(crate) fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

/// For patch fields: absent stays `None`, an explicit `null` becomes `Some(None)`.
/// Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn within(value: &str, min: usize, max: usize) -> bool {
    let len = value.trim().chars().count();
    len >= min && len <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("ana@example.com"));
        assert!(!is_email("ana.example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ana@example"));
        assert!(!is_email("ana@.com"));
        assert!(!is_email("a na@example.com"));
        assert!(!is_email("ana@ex@ample.com"));
    }

    #[test]
    fn length_is_counted_after_trim() {
        assert!(within("  ab ", 2, 2));
        assert!(!within("   ", 1, 10));
    }
}
