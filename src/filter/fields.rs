use lazy_static::lazy_static;
use std::collections::HashMap;
use std::net::IpAddr;

use crate::filter::expr::Literal;
use crate::models::packet::PacketRecord;

/// Fields a display filter can compare against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    IpAddr,
    IpSrc,
    IpDst,
    TcpPort,
    UdpPort,
}

/// One value pulled out of a record by a field extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Address(&'a str),
    Port(u16),
}

impl FieldValue<'_> {
    /// Equality against a filter literal; a mismatched kind is simply unequal
    pub fn equals(&self, literal: &Literal) -> bool {
        match *self {
            FieldValue::Address(address) => match (literal.address(), address.parse::<IpAddr>()) {
                (Some(expected), Ok(actual)) => expected == actual,
                _ => address.eq_ignore_ascii_case(literal.text()),
            },
            FieldValue::Port(port) => literal.port() == Some(port),
        }
    }
}

type Extractor = for<'a> fn(&'a PacketRecord) -> Vec<FieldValue<'a>>;

/// Registry entry: filter name, field and extraction function
pub struct FieldDef {
    pub name: &'static str,
    pub field: Field,
    pub description: &'static str,
    extract: Extractor,
}

/// Ordered by `Field` discriminant
static FIELD_TABLE: &[FieldDef] = &[
    FieldDef {
        name: "ip.addr",
        field: Field::IpAddr,
        description: "Source or destination address",
        extract: extract_ip_addr,
    },
    FieldDef {
        name: "ip.src",
        field: Field::IpSrc,
        description: "Source address",
        extract: extract_ip_src,
    },
    FieldDef {
        name: "ip.dst",
        field: Field::IpDst,
        description: "Destination address",
        extract: extract_ip_dst,
    },
    FieldDef {
        name: "tcp.port",
        field: Field::TcpPort,
        description: "Source or destination port of TCP records",
        extract: extract_tcp_port,
    },
    FieldDef {
        name: "udp.port",
        field: Field::UdpPort,
        description: "Source or destination port of UDP records",
        extract: extract_udp_port,
    },
];

lazy_static! {
    static ref FIELDS_BY_NAME: HashMap<&'static str, &'static FieldDef> =
        FIELD_TABLE.iter().map(|def| (def.name, def)).collect();
}

/// Look up a registered field by its filter name (case-insensitive)
pub fn lookup(name: &str) -> Option<Field> {
    FIELDS_BY_NAME
        .get(name.to_ascii_lowercase().as_str())
        .map(|def| def.field)
}

/// All registered fields in registration order
pub fn registered() -> impl Iterator<Item = &'static FieldDef> {
    FIELD_TABLE.iter()
}

impl Field {
    fn def(self) -> &'static FieldDef {
        &FIELD_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Every value this field has on `record`; empty when the field does not apply
    pub fn extract(self, record: &PacketRecord) -> Vec<FieldValue<'_>> {
        (self.def().extract)(record)
    }
}

fn extract_ip_addr(record: &PacketRecord) -> Vec<FieldValue<'_>> {
    record
        .source_address
        .iter()
        .chain(record.destination_address.iter())
        .map(|a| FieldValue::Address(a))
        .collect()
}

fn extract_ip_src(record: &PacketRecord) -> Vec<FieldValue<'_>> {
    record
        .source_address
        .iter()
        .map(|a| FieldValue::Address(a))
        .collect()
}

fn extract_ip_dst(record: &PacketRecord) -> Vec<FieldValue<'_>> {
    record
        .destination_address
        .iter()
        .map(|a| FieldValue::Address(a))
        .collect()
}

fn extract_tcp_port(record: &PacketRecord) -> Vec<FieldValue<'_>> {
    transport_ports(record, "TCP")
}

fn extract_udp_port(record: &PacketRecord) -> Vec<FieldValue<'_>> {
    transport_ports(record, "UDP")
}

fn transport_ports<'a>(record: &'a PacketRecord, protocol: &str) -> Vec<FieldValue<'a>> {
    if !record.protocol_tag.eq_ignore_ascii_case(protocol) {
        return Vec::new();
    }

    record
        .source_port
        .into_iter()
        .chain(record.destination_port)
        .map(FieldValue::Port)
        .collect()
}
