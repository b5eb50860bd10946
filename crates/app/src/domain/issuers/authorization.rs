//! Authorization header parsing.

/// Split `Bearer <issuer> <token>` into issuer and token.
///
/// The scheme is matched case-insensitively. Returns `None` when any part is
/// missing or empty.
#[must_use]
pub fn parse_authorization(header: &str) -> Option<(&str, &str)> {
    let mut parts = header.trim().splitn(3, ' ');

    let scheme = parts.next()?;
    let issuer = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || issuer.is_empty() || token.is_empty() {
        return None;
    }

    Some((issuer, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_issuer_and_token() {
        assert_eq!(
            parse_authorization("Bearer sp1 secret-token"),
            Some(("sp1", "secret-token"))
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(parse_authorization("bearer sp1 abc"), Some(("sp1", "abc")));
        assert_eq!(parse_authorization("BEARER sp1 abc"), Some(("sp1", "abc")));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(parse_authorization(""), None);
        assert_eq!(parse_authorization("Bearer"), None);
        assert_eq!(parse_authorization("Bearer sp1"), None);
        assert_eq!(parse_authorization("Bearer  abc"), None);
        assert_eq!(parse_authorization("Basic sp1 abc"), None);
    }
}
