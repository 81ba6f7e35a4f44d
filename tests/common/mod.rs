use serde_json::json;
use sharkview::models::packet::PacketRecordDetail;

/// A capture of `count` records alternating between a TLS flow and DNS
pub fn capture(count: u64) -> Vec<PacketRecordDetail> {
    (1..=count)
        .map(|n| {
            let value = if n % 2 == 1 {
                json!({
                    "number": n,
                    "time": format!("2024-05-01T12:00:{:02}.000000", n % 60),
                    "src_ip": "10.0.0.5",
                    "dst_ip": "93.184.216.34",
                    "src_port": 50100,
                    "dst_port": 443,
                    "protocol": "TCP",
                    "length": 60 + n,
                    "info": "50100 -> 443 [ACK]",
                    "layers": { "frame": { "number": n } }
                })
            } else {
                json!({
                    "number": n,
                    "time": format!("2024-05-01T12:00:{:02}.000000", n % 60),
                    "src_ip": "10.0.0.7",
                    "dst_ip": "8.8.8.8",
                    "src_port": 53000 + n,
                    "dst_port": 53,
                    "protocol": "DNS",
                    "length": 70 + n,
                    "info": "Standard query A example.com",
                    "layers": { "dns": { "qry_name": "example.com" } }
                })
            };
            serde_json::from_value(value).expect("valid fixture record")
        })
        .collect()
}
