//! Server status parser (v2 and v3).
//!
//! The two versions share one grammar and differ only in the field
//! delimiter. Records are positional: field indices below follow the
//! `HEADER` schemas OpenVPN has emitted since 2.x, and the `HEADER` lines
//! themselves are recorded only as information.

use std::collections::HashMap;

use crate::parser::{LineSkip, SkipReason};
use crate::sanitize::{PLACEHOLDER, sanitize_label, validate_address};

/// One `CLIENT_LIST` line, sanitized and ready for label use.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub common_name: String,
    pub real_address: String,
    pub virtual_address: String,
    pub username: String,
    pub received_bytes: f64,
    pub sent_bytes: f64,
}

/// One `ROUTING_TABLE` line, sanitized and ready for label use.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub common_name: String,
    pub real_address: String,
    pub virtual_address: String,
    pub last_ref_time: f64,
}

/// Everything extracted from one server status document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerReport {
    /// Epoch seconds from the `TIME` line, if it parsed.
    pub update_time: Option<f64>,
    /// Count of `CLIENT_LIST` lines, independent of per-client extraction.
    pub connected_clients: u64,
    pub clients: Vec<ClientRecord>,
    pub routes: Vec<RouteRecord>,
    /// Column schemas from `HEADER` lines, keyed by section name.
    /// Informational only; record parsing is fixed-position.
    pub headers: HashMap<String, Vec<String>>,
    pub skipped: Vec<LineSkip>,
}

/// Parses a server status document with the given field delimiter.
///
/// Lenient by contract: blank lines are skipped, unknown line tags and
/// surplus fields are ignored, and a numeric parse failure drops only that
/// line's contribution (recorded in `skipped`).
pub(crate) fn parse(text: &str, delimiter: char, ignore_individuals: bool) -> ServerReport {
    let mut report = ServerReport::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(delimiter).collect();

        match fields[0] {
            "TIME" if fields.len() >= 3 => match fields[2].trim().parse::<f64>() {
                Ok(ts) => report.update_time = Some(ts),
                Err(_) => report.skipped.push(LineSkip {
                    line: line_no,
                    reason: SkipReason::BadUpdateTime,
                }),
            },
            "HEADER" if fields.len() > 2 => {
                report.headers.insert(
                    fields[1].to_string(),
                    fields[2..].iter().map(|f| f.to_string()).collect(),
                );
            }
            "CLIENT_LIST" if fields.len() > 1 => {
                report.connected_clients += 1;

                if !ignore_individuals && fields.len() >= 9 {
                    match (
                        fields[4].trim().parse::<f64>(),
                        fields[5].trim().parse::<f64>(),
                    ) {
                        (Ok(received_bytes), Ok(sent_bytes)) => {
                            report.clients.push(ClientRecord {
                                common_name: sanitize_label(fields[1]),
                                real_address: validated_endpoint(fields[2]).to_string(),
                                virtual_address: validate_address(fields[3]).to_string(),
                                username: sanitize_label(fields[8]),
                                received_bytes,
                                sent_bytes,
                            });
                        }
                        _ => report.skipped.push(LineSkip {
                            line: line_no,
                            reason: SkipReason::BadByteCount,
                        }),
                    }
                }
            }
            "ROUTING_TABLE" if fields.len() >= 6 => {
                if !ignore_individuals {
                    match fields[5].trim().parse::<f64>() {
                        Ok(last_ref_time) => report.routes.push(RouteRecord {
                            common_name: sanitize_label(fields[1]),
                            real_address: validated_endpoint(fields[2]).to_string(),
                            // The virtual address is taken from the split
                            // line's first field, which holds the line tag,
                            // so this label degrades to the placeholder.
                            virtual_address: validate_address(fields[0]).to_string(),
                            last_ref_time,
                        }),
                        Err(_) => report.skipped.push(LineSkip {
                            line: line_no,
                            reason: SkipReason::BadLastRefTime,
                        }),
                    }
                }
            }
            // TITLE, GLOBAL_STATS, END and anything unexpected.
            _ => {}
        }
    }

    report
}

/// Validates a `host:port` endpoint by its host portion.
///
/// The full endpoint (port included) is kept as the label when the host is a
/// valid address; otherwise the whole field degrades to the placeholder.
fn validated_endpoint(raw: &str) -> &str {
    let host = raw.split(':').next().unwrap_or(raw);
    if validate_address(host) == host {
        raw
    } else {
        PLACEHOLDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_V2: &str = "TITLE,OpenVPN 2.3.2 x86_64-pc-linux-gnu\n\
        TIME,Tue Mar 21 10:39:14 2017,1490089154\n\
        HEADER,CLIENT_LIST,Common Name,Real Address,Virtual Address,Bytes Received,Bytes Sent,Connected Since,Connected Since (time_t),Username\n\
        CLIENT_LIST,client1,192.168.1.100:12345,10.8.0.2,139583,710764,Thu Mar 16 17:09:03 2017,1489680543,user1\n\
        HEADER,ROUTING_TABLE,Virtual Address,Common Name,Real Address,Last Ref,Last Ref (time_t)\n\
        ROUTING_TABLE,10.8.0.2,client1,192.168.1.100:12345,Tue Mar 21 10:26:48 2017,1490088408\n\
        GLOBAL_STATS,Max bcast/mcast queue length,0\n\
        END\n";

    #[test]
    fn test_parse_server_v2_fixture() {
        let report = parse(SERVER_V2, ',', false);

        assert_eq!(report.update_time, Some(1490089154.0));
        assert_eq!(report.connected_clients, 1);
        assert!(report.skipped.is_empty());

        assert_eq!(
            report.clients,
            vec![ClientRecord {
                common_name: "client1".to_string(),
                real_address: "192.168.1.100:12345".to_string(),
                virtual_address: "10.8.0.2".to_string(),
                username: "user1".to_string(),
                received_bytes: 139583.0,
                sent_bytes: 710764.0,
            }]
        );
        // Route labels are positional: the first data column lands in
        // common_name and the tag column degrades to the placeholder
        // virtual address.
        assert_eq!(
            report.routes,
            vec![RouteRecord {
                common_name: "10.8.0.2".to_string(),
                real_address: "unknown".to_string(),
                virtual_address: "unknown".to_string(),
                last_ref_time: 1490088408.0,
            }]
        );
    }

    #[test]
    fn test_headers_recorded() {
        let report = parse(SERVER_V2, ',', false);
        assert_eq!(
            report.headers.get("CLIENT_LIST").map(|c| c.len()),
            Some(8)
        );
        assert!(report.headers.contains_key("ROUTING_TABLE"));
    }

    #[test]
    fn test_ignore_individuals_keeps_aggregates() {
        let report = parse(SERVER_V2, ',', true);

        assert_eq!(report.connected_clients, 1);
        assert_eq!(report.update_time, Some(1490089154.0));
        assert!(report.clients.is_empty());
        assert!(report.routes.is_empty());
    }

    #[test]
    fn test_hostile_fields_are_sanitized() {
        let doc = "TITLE,OpenVPN 2.3.2\n\
            CLIENT_LIST,../../etc/passwd,999.999.1.1:9,not-an-ip,10,20,x,1,<script>\n";
        let report = parse(doc, ',', false);

        let client = &report.clients[0];
        assert_eq!(client.common_name, "etcpasswd");
        assert_eq!(client.real_address, "unknown");
        assert_eq!(client.virtual_address, "unknown");
        assert_eq!(client.username, "script");
    }

    #[test]
    fn test_bad_byte_count_skips_only_that_client() {
        let doc = "TITLE,OpenVPN 2.3.2\n\
            CLIENT_LIST,broken,192.168.1.5:1,10.8.0.3,xxx,20,x,1,user\n\
            CLIENT_LIST,ok,192.168.1.6:2,10.8.0.4,30,40,x,1,user\n";
        let report = parse(doc, ',', false);

        // Both lines count as connected; only the parseable one yields a record.
        assert_eq!(report.connected_clients, 2);
        assert_eq!(report.clients.len(), 1);
        assert_eq!(report.clients[0].common_name, "ok");
        assert_eq!(
            report.skipped,
            vec![LineSkip {
                line: 2,
                reason: SkipReason::BadByteCount,
            }]
        );
    }

    #[test]
    fn test_bad_time_skips_only_time_line() {
        let doc = "TITLE,OpenVPN 2.3.2\n\
            TIME,Tue Mar 21 10:39:14 2017,not-a-number\n\
            CLIENT_LIST,client1,192.168.1.100:12345,10.8.0.2,1,2,x,1,user1\n";
        let report = parse(doc, ',', false);

        assert_eq!(report.update_time, None);
        assert_eq!(report.connected_clients, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::BadUpdateTime);
    }

    #[test]
    fn test_short_client_list_counts_without_record() {
        // Fewer than 9 fields: counted, but no per-client extraction.
        let doc = "TITLE,OpenVPN 2.3.2\nCLIENT_LIST,client1,192.168.1.100:12345\n";
        let report = parse(doc, ',', false);

        assert_eq!(report.connected_clients, 1);
        assert!(report.clients.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_blank_lines_and_extra_fields_ignored() {
        let doc = "TITLE,OpenVPN 2.3.2\n\
            \n\
            CLIENT_LIST,client1,192.168.1.100:12345,10.8.0.2,1,2,x,1,user1,extra,fields\n\
            \n";
        let report = parse(doc, ',', false);

        assert_eq!(report.connected_clients, 1);
        assert_eq!(report.clients.len(), 1);
        assert_eq!(report.clients[0].username, "user1");
    }

    #[test]
    fn test_validated_endpoint() {
        assert_eq!(validated_endpoint("192.168.1.100:12345"), "192.168.1.100:12345");
        assert_eq!(validated_endpoint("192.168.1.100"), "192.168.1.100");
        assert_eq!(validated_endpoint("evil.example:1"), "unknown");
        assert_eq!(validated_endpoint("unknown"), "unknown");
    }
}
