use once_cell::sync::Lazy;
use regex::Regex;

/// Letters, digits, hyphens and underscores (agent names, usernames)
pub static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("identifier pattern compiles"));

/// Dotted-quad IPv4 with every octet in 0..=255
pub static IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    )
    .expect("ipv4 pattern compiles")
});

/// Host name with at least one dot and an alphabetic TLD
pub static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain pattern compiles")
});

pub static HAS_UPPERCASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]").expect("uppercase pattern compiles"));

pub static HAS_LOWERCASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z]").expect("lowercase pattern compiles"));

pub static HAS_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]").expect("digit pattern compiles"));

pub fn is_valid_ipv4(ip: &str) -> bool {
    IPV4.is_match(ip)
}

pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN.is_match(domain)
}

pub fn is_valid_port(port: &str) -> bool {
    matches!(port.trim().parse::<u32>(), Ok(p) if (1..=65535).contains(&p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_pattern() {
        assert!(is_valid_ipv4("192.168.1.100"));
        assert!(is_valid_ipv4("10.0.0.5"));
        assert!(is_valid_ipv4("0.0.0.0"));
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("192.168.1"));
        assert!(!is_valid_ipv4("192.168.1.1.1"));
        assert!(!is_valid_ipv4("a.b.c.d"));
    }

    #[test]
    fn test_domain_pattern() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("sub.example.co.uk"));
        assert!(!is_valid_domain("not a domain"));
        assert!(!is_valid_domain("-example.com"));
        assert!(!is_valid_domain("localhost"));
    }

    #[test]
    fn test_port_helper() {
        assert!(is_valid_port("1"));
        assert!(is_valid_port("65535"));
        assert!(!is_valid_port("0"));
        assert!(!is_valid_port("65536"));
        assert!(!is_valid_port("http"));
    }
}
