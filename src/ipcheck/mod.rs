//! IPv4 address-class validation for IPAM records.

use std::net::Ipv4Addr;

/// Why an address was rejected. Checks run in a fixed order; the first
/// matching class wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRejection {
    Malformed,
    Multicast,
    Loopback,
    LinkLocal,
    Broadcast,
    Reserved,
}

impl std::fmt::Display for IpRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            IpRejection::Malformed => "it is not a valid IPv4 address",
            IpRejection::Multicast => "it is a multicast address",
            IpRejection::Loopback => "it is a loopback address",
            IpRejection::LinkLocal => "it is a link-local address",
            IpRejection::Broadcast => "it is a broadcast address",
            IpRejection::Reserved => "it is a reserved address",
        };
        write!(f, "{}", reason)
    }
}

/// Classify a dotted-quad address, optionally in `a.b.c.d/prefix` form.
pub fn validate_ipv4(input: &str) -> Result<Ipv4Addr, IpRejection> {
    let (addr_part, prefix_part) = match input.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (input, None),
    };

    if let Some(prefix) = prefix_part {
        let valid_prefix = prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false);
        if !valid_prefix {
            return Err(IpRejection::Malformed);
        }
    }

    let addr: Ipv4Addr = addr_part.parse().map_err(|_| IpRejection::Malformed)?;

    if addr.is_multicast() {
        return Err(IpRejection::Multicast);
    }
    if addr.is_loopback() {
        return Err(IpRejection::Loopback);
    }
    if addr.is_link_local() {
        return Err(IpRejection::LinkLocal);
    }
    if addr == Ipv4Addr::BROADCAST {
        return Err(IpRejection::Broadcast);
    }
    // 240.0.0.0/4 less the limited broadcast handled above
    if addr.octets()[0] >= 240 {
        return Err(IpRejection::Reserved);
    }

    Ok(addr)
}

/// One report line per address, e.g. `Valid 10.0.0.1` or
/// `Invalid 224.0.0.1 - it is a multicast address`.
pub fn describe(input: &str) -> String {
    match validate_ipv4(input) {
        Ok(_) => format!("Valid {}", input),
        Err(rejection) => format!("Invalid {} - {}", input, rejection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(validate_ipv4("10.0.0.1").is_ok());
        assert!(validate_ipv4("192.168.1.254").is_ok());
        assert!(validate_ipv4("8.8.8.8").is_ok());
        assert!(validate_ipv4("10.0.0.1/24").is_ok());
    }

    #[test]
    fn test_address_classes() {
        assert_eq!(validate_ipv4("224.0.0.1"), Err(IpRejection::Multicast));
        assert_eq!(validate_ipv4("127.0.0.1"), Err(IpRejection::Loopback));
        assert_eq!(validate_ipv4("169.254.10.1"), Err(IpRejection::LinkLocal));
        assert_eq!(
            validate_ipv4("255.255.255.255"),
            Err(IpRejection::Broadcast)
        );
        assert_eq!(validate_ipv4("240.0.0.1"), Err(IpRejection::Reserved));
        assert_eq!(validate_ipv4("250.1.2.3"), Err(IpRejection::Reserved));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(validate_ipv4(""), Err(IpRejection::Malformed));
        assert_eq!(validate_ipv4("not-an-ip"), Err(IpRejection::Malformed));
        assert_eq!(validate_ipv4("256.1.1.1"), Err(IpRejection::Malformed));
        assert_eq!(validate_ipv4("1.2.3"), Err(IpRejection::Malformed));
        assert_eq!(validate_ipv4("10.0.0.1/33"), Err(IpRejection::Malformed));
        assert_eq!(validate_ipv4("10.0.0.1/x"), Err(IpRejection::Malformed));
    }

    #[test]
    fn test_describe_lines() {
        assert_eq!(describe("10.0.0.1"), "Valid 10.0.0.1");
        assert_eq!(
            describe("224.0.0.1"),
            "Invalid 224.0.0.1 - it is a multicast address"
        );
        assert_eq!(
            describe("999.0.0.1"),
            "Invalid 999.0.0.1 - it is not a valid IPv4 address"
        );
    }
}
