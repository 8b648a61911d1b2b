use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};

use crate::ty::IpFamily;

/// Parse an IP literal of the requested family.
pub fn decode(raw: &str, family: IpFamily) -> Result<IpAddr, AddrParseError> {
    match family {
        IpFamily::Any => raw.parse::<IpAddr>(),
        IpFamily::V4 => raw.parse::<Ipv4Addr>().map(IpAddr::V4),
        IpFamily::V6 => raw.parse::<Ipv6Addr>().map(IpAddr::V6),
    }
}

/// Canonical textual form (RFC 5952 for v6).
pub fn encode(addr: &IpAddr) -> String {
    addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_strict() {
        assert!(decode("192.168.1.1", IpFamily::V4).is_ok());
        assert!(decode("192.168.1.1", IpFamily::V6).is_err());
        assert!(decode("::1", IpFamily::V4).is_err());
        assert!(decode("::1", IpFamily::Any).unwrap().is_ipv6());
    }

    #[test]
    fn v6_is_canonicalized() {
        let addr = decode("2001:0db8:0000:0000:0000:0000:0000:0001", IpFamily::V6).unwrap();
        assert_eq!(encode(&addr), "2001:db8::1");
    }

    #[test]
    fn non_addresses_fail() {
        assert!(decode("localhost", IpFamily::Any).is_err());
        assert!(decode("256.1.1.1", IpFamily::V4).is_err());
    }
}
