//! Client statistics parser (`OpenVPN STATISTICS` dump).
//!
//! A flat comma-delimited key/value format with a fixed vocabulary of byte
//! counters and an `Updated` timestamp. Unrecognized keys are ignored, and a
//! corrupt value silently drops that one line — one bad stat must not blank
//! out the whole client's metrics.

use chrono::NaiveDateTime;

use crate::parser::{LineSkip, SkipReason};

/// The named byte counters a client statistics dump may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    TunTapRead,
    TunTapWrite,
    TcpUdpRead,
    TcpUdpWrite,
    AuthRead,
    PreCompress,
    PostCompress,
    PreDecompress,
    PostDecompress,
}

impl StatCounter {
    /// Maps a key label from the file to its counter, if recognized.
    fn from_key(key: &str) -> Option<StatCounter> {
        match key {
            "TUN/TAP read bytes" => Some(StatCounter::TunTapRead),
            "TUN/TAP write bytes" => Some(StatCounter::TunTapWrite),
            "TCP/UDP read bytes" => Some(StatCounter::TcpUdpRead),
            "TCP/UDP write bytes" => Some(StatCounter::TcpUdpWrite),
            "Auth read bytes" => Some(StatCounter::AuthRead),
            "pre-compress bytes" => Some(StatCounter::PreCompress),
            "post-compress bytes" => Some(StatCounter::PostCompress),
            "pre-decompress bytes" => Some(StatCounter::PreDecompress),
            "post-decompress bytes" => Some(StatCounter::PostDecompress),
            _ => None,
        }
    }
}

/// Everything extracted from one client statistics document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientStatsReport {
    /// Epoch seconds from the `Updated` line, if it parsed.
    pub update_time: Option<f64>,
    /// Recognized counters with their literal file values, in file order.
    pub counters: Vec<(StatCounter, f64)>,
    pub skipped: Vec<LineSkip>,
}

/// Parses a client statistics document.
pub(crate) fn parse(text: &str) -> ClientStatsReport {
    let mut report = ClientStatsReport::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            continue;
        }

        if fields[0] == "Updated" {
            match parse_updated(fields[1].trim()) {
                Some(ts) => report.update_time = Some(ts),
                None => report.skipped.push(LineSkip {
                    line: line_no,
                    reason: SkipReason::BadUpdateTime,
                }),
            }
        } else if let Some(counter) = StatCounter::from_key(fields[0]) {
            match fields[1].trim().parse::<f64>() {
                Ok(value) => report.counters.push((counter, value)),
                Err(_) => report.skipped.push(LineSkip {
                    line: line_no,
                    reason: SkipReason::BadStatValue,
                }),
            }
        }
    }

    report
}

/// Parses the `Updated` value (`<weekday> <month> <day> <HH:MM:SS> <year>`)
/// as a UTC timestamp.
fn parse_updated(raw: &str) -> Option<f64> {
    let naive = NaiveDateTime::parse_from_str(raw, "%a %b %e %H:%M:%S %Y").ok()?;
    Some(naive.and_utc().timestamp() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_STATS: &str = "OpenVPN STATISTICS\n\
        Updated,Tue Mar 21 10:39:09 2017\n\
        TUN/TAP read bytes,153789941\n\
        TUN/TAP write bytes,308764078\n\
        TCP/UDP read bytes,292806201\n\
        TCP/UDP write bytes,197558969\n\
        Auth read bytes,308854782\n\
        pre-compress bytes,45388190\n\
        post-compress bytes,45446864\n\
        pre-decompress bytes,162596168\n\
        post-decompress bytes,216965355\n\
        END\n";

    #[test]
    fn test_parse_client_stats_fixture() {
        let report = parse(CLIENT_STATS);

        // Tue Mar 21 10:39:09 2017 UTC.
        assert_eq!(report.update_time, Some(1490092749.0));
        assert!(report.skipped.is_empty());
        assert_eq!(
            report.counters,
            vec![
                (StatCounter::TunTapRead, 153789941.0),
                (StatCounter::TunTapWrite, 308764078.0),
                (StatCounter::TcpUdpRead, 292806201.0),
                (StatCounter::TcpUdpWrite, 197558969.0),
                (StatCounter::AuthRead, 308854782.0),
                (StatCounter::PreCompress, 45388190.0),
                (StatCounter::PostCompress, 45446864.0),
                (StatCounter::PreDecompress, 162596168.0),
                (StatCounter::PostDecompress, 216965355.0),
            ]
        );
    }

    #[test]
    fn test_single_digit_day() {
        let report = parse("OpenVPN STATISTICS\nUpdated,Mon Jan 1 12:00:00 2024\nEND\n");
        assert_eq!(report.update_time, Some(1704110400.0));
    }

    #[test]
    fn test_corrupt_value_drops_only_that_line() {
        let doc = "OpenVPN STATISTICS\n\
            TUN/TAP read bytes,garbage\n\
            TUN/TAP write bytes,42\n\
            END\n";
        let report = parse(doc);

        assert_eq!(report.counters, vec![(StatCounter::TunTapWrite, 42.0)]);
        assert_eq!(
            report.skipped,
            vec![LineSkip {
                line: 2,
                reason: SkipReason::BadStatValue,
            }]
        );
    }

    #[test]
    fn test_corrupt_updated_is_skipped() {
        let report = parse("OpenVPN STATISTICS\nUpdated,yesterday\nAuth read bytes,7\n");
        assert_eq!(report.update_time, None);
        assert_eq!(report.counters, vec![(StatCounter::AuthRead, 7.0)]);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_unrecognized_keys_ignored() {
        let report = parse("OpenVPN STATISTICS\nSomething new,123\nEND\n");
        assert!(report.counters.is_empty());
        assert!(report.skipped.is_empty());
    }
}
