//! Raw inventory message parsing
//!
//! One inventory message is an `@`-separated string carrying a service
//! name, an optional datacenter, an optional node, and a value. Parsing
//! is pure and silent: a malformed message yields `None`, never an
//! error. Bad entries in the inventory are dropped, not fatal.

/// One parsed synchronization unit, ready for validation and dispatch.
///
/// `datacenter` and `node` are empty strings when the message did not
/// carry them; the validator treats empty as "no constraint".
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Service name, expected to end in `_tcp_<port>` or `_udp_<port>`
    pub service: String,
    /// Datacenter scope, empty when absent
    pub datacenter: String,
    /// Node scope, empty when absent
    pub node: String,
    /// Raw value: a `$NAME$` placeholder, a CIDR block, or an opaque string
    pub value: String,
}

impl Record {
    /// Parse one raw inventory message.
    ///
    /// Accepts exactly 2, 3, or 4 `@`-separated segments:
    /// - 2 segments → `service@value`
    /// - 3 segments → `service@datacenter@value`
    /// - 4 segments → `service@datacenter@node@value`
    ///
    /// Anything else (including a message with no `@` at all) is
    /// rejected with `None`.
    pub fn parse(message: &str) -> Option<Record> {
        if !message.contains('@') {
            return None;
        }
        let segments: Vec<&str> = message.split('@').collect();
        let record = match segments.as_slice() {
            [service, value] => Record {
                service: (*service).to_string(),
                datacenter: String::new(),
                node: String::new(),
                value: (*value).to_string(),
            },
            [service, datacenter, value] => Record {
                service: (*service).to_string(),
                datacenter: (*datacenter).to_string(),
                node: String::new(),
                value: (*value).to_string(),
            },
            [service, datacenter, node, value] => Record {
                service: (*service).to_string(),
                datacenter: (*datacenter).to_string(),
                node: (*node).to_string(),
                value: (*value).to_string(),
            },
            _ => return None,
        };
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_segments_map_to_service_and_value() {
        let record = Record::parse("web_tcp_80@$LAN$").unwrap();
        assert_eq!(record.service, "web_tcp_80");
        assert_eq!(record.datacenter, "");
        assert_eq!(record.node, "");
        assert_eq!(record.value, "$LAN$");
    }

    #[test]
    fn three_segments_map_to_service_dc_value() {
        let record = Record::parse("web_tcp_80@dc1@10.0.0.0/24").unwrap();
        assert_eq!(record.service, "web_tcp_80");
        assert_eq!(record.datacenter, "dc1");
        assert_eq!(record.node, "");
        assert_eq!(record.value, "10.0.0.0/24");
    }

    #[test]
    fn four_segments_map_to_service_dc_node_value() {
        let record = Record::parse("svc_tcp_8080@dc1@node1@10.0.0.5/24").unwrap();
        assert_eq!(record.service, "svc_tcp_8080");
        assert_eq!(record.datacenter, "dc1");
        assert_eq!(record.node, "node1");
        assert_eq!(record.value, "10.0.0.5/24");
    }

    #[test]
    fn no_separator_is_rejected() {
        assert_eq!(Record::parse("plain-string"), None);
        assert_eq!(Record::parse(""), None);
    }

    #[test]
    fn wrong_segment_counts_are_rejected() {
        // five segments
        assert_eq!(Record::parse("a@b@c@d@e"), None);
        // one '@' splits into two segments and is accepted, so force six
        assert_eq!(Record::parse("a@b@c@d@e@f"), None);
    }

    #[test]
    fn empty_segments_are_preserved() {
        // "@@" splits into three empty segments; field layout still applies
        let record = Record::parse("@@").unwrap();
        assert_eq!(record.service, "");
        assert_eq!(record.datacenter, "");
        assert_eq!(record.value, "");
    }
}
