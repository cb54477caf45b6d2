//! Prometheus metric registry fed from parsed status documents.
//!
//! The model owns its `Registry` and metric handles — there are no ambient
//! singletons, so tests and embedders construct as many independent models
//! as they need. Identical label tuples always address the same series, and
//! counters only ever move by non-negative finite deltas: a negative or
//! unparseable value skips its increment rather than corrupting the series.
//!
//! Per-client byte counters are re-incremented by the literal file value on
//! every scrape. OpenVPN's own on-file counters are per-session cumulative,
//! so the exported series remain genuine accumulators across the process
//! lifetime.

use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, Opts, Registry};
use tracing::debug;

use crate::parser::client_stats::StatCounter;
use crate::parser::server::{ClientRecord, RouteRecord};

/// Labels carried by every per-client byte counter.
const CLIENT_LABELS: &[&str] = &[
    "status_path",
    "common_name",
    "real_address",
    "virtual_address",
    "username",
];

/// Labels carried by the route last-reference gauge.
const ROUTE_LABELS: &[&str] = &[
    "status_path",
    "common_name",
    "real_address",
    "virtual_address",
];

/// The exporter's full metric set.
pub struct MetricsModel {
    registry: Registry,
    up: GaugeVec,
    status_update_time: GaugeVec,
    connected_clients: GaugeVec,
    client_received_bytes: CounterVec,
    client_sent_bytes: CounterVec,
    route_last_reference_time: GaugeVec,
    tun_tap_read_bytes: CounterVec,
    tun_tap_write_bytes: CounterVec,
    tcp_udp_read_bytes: CounterVec,
    tcp_udp_write_bytes: CounterVec,
    auth_read_bytes: CounterVec,
    pre_compress_bytes: CounterVec,
    post_compress_bytes: CounterVec,
    pre_decompress_bytes: CounterVec,
    post_decompress_bytes: CounterVec,
}

impl Default for MetricsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsModel {
    /// Builds the registry and registers every metric.
    ///
    /// Registration failures are programming errors (duplicate or invalid
    /// metric definitions), so this panics at construction time rather than
    /// propagating.
    pub fn new() -> Self {
        let registry = Registry::new();

        let per_path = |name, help| gauge_vec(&registry, name, help, &["status_path"]);
        let client_counter =
            |name, help| counter_vec(&registry, name, help, &["status_path"]);

        Self {
            up: per_path(
                "openvpn_up",
                "Whether scraping OpenVPN metrics was successful.",
            ),
            status_update_time: per_path(
                "openvpn_status_update_time_seconds",
                "UNIX timestamp at which the OpenVPN statistics were updated.",
            ),
            connected_clients: per_path(
                "openvpn_server_connected_clients",
                "Number of connected clients.",
            ),
            client_received_bytes: counter_vec(
                &registry,
                "openvpn_server_client_received_bytes_total",
                "Amount of data received over a connection on the VPN server, in bytes.",
                CLIENT_LABELS,
            ),
            client_sent_bytes: counter_vec(
                &registry,
                "openvpn_server_client_sent_bytes_total",
                "Amount of data sent over a connection on the VPN server, in bytes.",
                CLIENT_LABELS,
            ),
            route_last_reference_time: gauge_vec(
                &registry,
                "openvpn_server_route_last_reference_time_seconds",
                "Time at which a route was last referenced, in seconds.",
                ROUTE_LABELS,
            ),
            tun_tap_read_bytes: client_counter(
                "openvpn_client_tun_tap_read_bytes_total",
                "Total amount of TUN/TAP traffic read, in bytes.",
            ),
            tun_tap_write_bytes: client_counter(
                "openvpn_client_tun_tap_write_bytes_total",
                "Total amount of TUN/TAP traffic written, in bytes.",
            ),
            tcp_udp_read_bytes: client_counter(
                "openvpn_client_tcp_udp_read_bytes_total",
                "Total amount of TCP/UDP traffic read, in bytes.",
            ),
            tcp_udp_write_bytes: client_counter(
                "openvpn_client_tcp_udp_write_bytes_total",
                "Total amount of TCP/UDP traffic written, in bytes.",
            ),
            auth_read_bytes: client_counter(
                "openvpn_client_auth_read_bytes_total",
                "Total amount of authentication traffic read, in bytes.",
            ),
            pre_compress_bytes: client_counter(
                "openvpn_client_pre_compress_bytes_total",
                "Total amount of data before compression, in bytes.",
            ),
            post_compress_bytes: client_counter(
                "openvpn_client_post_compress_bytes_total",
                "Total amount of data after compression, in bytes.",
            ),
            pre_decompress_bytes: client_counter(
                "openvpn_client_pre_decompress_bytes_total",
                "Total amount of data before decompression, in bytes.",
            ),
            post_decompress_bytes: client_counter(
                "openvpn_client_post_decompress_bytes_total",
                "Total amount of data after decompression, in bytes.",
            ),
            registry,
        }
    }

    /// Sets the scrape-success gauge for one status path.
    pub fn set_up(&self, status_path: &str, up: bool) {
        self.up
            .with_label_values(&[status_path])
            .set(if up { 1.0 } else { 0.0 });
    }

    /// Sets the status-file update timestamp for one status path.
    pub fn set_update_time(&self, status_path: &str, epoch_seconds: f64) {
        self.status_update_time
            .with_label_values(&[status_path])
            .set(epoch_seconds);
    }

    /// Overwrites the connected-clients gauge for one status path.
    pub fn set_connected_clients(&self, status_path: &str, count: f64) {
        self.connected_clients
            .with_label_values(&[status_path])
            .set(count);
    }

    /// Accumulates one client's received/sent byte counters.
    pub fn observe_client(&self, status_path: &str, client: &ClientRecord) {
        let labels = [
            status_path,
            client.common_name.as_str(),
            client.real_address.as_str(),
            client.virtual_address.as_str(),
            client.username.as_str(),
        ];
        inc_checked(&self.client_received_bytes, &labels, client.received_bytes);
        inc_checked(&self.client_sent_bytes, &labels, client.sent_bytes);
    }

    /// Sets one route's last-reference gauge.
    pub fn observe_route(&self, status_path: &str, route: &RouteRecord) {
        self.route_last_reference_time
            .with_label_values(&[
                status_path,
                route.common_name.as_str(),
                route.real_address.as_str(),
                route.virtual_address.as_str(),
            ])
            .set(route.last_ref_time);
    }

    /// Accumulates one named client-stats counter.
    pub fn inc_stat_counter(&self, status_path: &str, counter: StatCounter, value: f64) {
        let vec = match counter {
            StatCounter::TunTapRead => &self.tun_tap_read_bytes,
            StatCounter::TunTapWrite => &self.tun_tap_write_bytes,
            StatCounter::TcpUdpRead => &self.tcp_udp_read_bytes,
            StatCounter::TcpUdpWrite => &self.tcp_udp_write_bytes,
            StatCounter::AuthRead => &self.auth_read_bytes,
            StatCounter::PreCompress => &self.pre_compress_bytes,
            StatCounter::PostCompress => &self.post_compress_bytes,
            StatCounter::PreDecompress => &self.pre_decompress_bytes,
            StatCounter::PostDecompress => &self.post_decompress_bytes,
        };
        inc_checked(vec, &[status_path], value);
    }

    /// Snapshots every registered metric family for text encoding.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

/// Increments a counter only by non-negative finite deltas.
fn inc_checked(vec: &CounterVec, labels: &[&str], value: f64) {
    if !value.is_finite() || value < 0.0 {
        debug!(value, "skipping counter increment for invalid delta");
        return;
    }
    vec.with_label_values(labels).inc_by(value);
}

fn gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    let gauge = GaugeVec::new(Opts::new(name, help), labels).expect("valid gauge definition");
    registry
        .register(Box::new(gauge.clone()))
        .expect("unique gauge registration");
    gauge
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let counter =
        CounterVec::new(Opts::new(name, help), labels).expect("valid counter definition");
    registry
        .register(Box::new(counter.clone()))
        .expect("unique counter registration");
    counter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family_value(model: &MetricsModel, name: &str, status_path: &str) -> Option<f64> {
        model
            .gather()
            .into_iter()
            .find(|f| f.get_name() == name)
            .and_then(|family| {
                family
                    .get_metric()
                    .iter()
                    .find(|m| {
                        m.get_label().iter().any(|l| {
                            l.get_name() == "status_path" && l.get_value() == status_path
                        })
                    })
                    .map(|m| {
                        if m.has_counter() {
                            m.get_counter().get_value()
                        } else {
                            m.get_gauge().get_value()
                        }
                    })
            })
    }

    #[test]
    fn test_up_gauge_overwrites() {
        let model = MetricsModel::new();
        model.set_up("a.status", false);
        model.set_up("a.status", true);
        assert_eq!(family_value(&model, "openvpn_up", "a.status"), Some(1.0));

        model.set_up("a.status", false);
        assert_eq!(family_value(&model, "openvpn_up", "a.status"), Some(0.0));
    }

    #[test]
    fn test_paths_are_independent_series() {
        let model = MetricsModel::new();
        model.set_connected_clients("a.status", 3.0);
        model.set_connected_clients("b.status", 7.0);

        assert_eq!(
            family_value(&model, "openvpn_server_connected_clients", "a.status"),
            Some(3.0)
        );
        assert_eq!(
            family_value(&model, "openvpn_server_connected_clients", "b.status"),
            Some(7.0)
        );
    }

    #[test]
    fn test_client_counters_accumulate() {
        let model = MetricsModel::new();
        let client = ClientRecord {
            common_name: "client1".to_string(),
            real_address: "192.168.1.100:12345".to_string(),
            virtual_address: "10.8.0.2".to_string(),
            username: "user1".to_string(),
            received_bytes: 100.0,
            sent_bytes: 50.0,
        };
        model.observe_client("a.status", &client);
        model.observe_client("a.status", &client);

        assert_eq!(
            family_value(&model, "openvpn_server_client_received_bytes_total", "a.status"),
            Some(200.0)
        );
        assert_eq!(
            family_value(&model, "openvpn_server_client_sent_bytes_total", "a.status"),
            Some(100.0)
        );
    }

    #[test]
    fn test_negative_and_nonfinite_deltas_skipped() {
        let model = MetricsModel::new();
        model.inc_stat_counter("a.status", StatCounter::AuthRead, 10.0);
        model.inc_stat_counter("a.status", StatCounter::AuthRead, -5.0);
        model.inc_stat_counter("a.status", StatCounter::AuthRead, f64::NAN);
        model.inc_stat_counter("a.status", StatCounter::AuthRead, f64::INFINITY);

        assert_eq!(
            family_value(&model, "openvpn_client_auth_read_bytes_total", "a.status"),
            Some(10.0)
        );
    }

    #[test]
    fn test_route_gauge_sets_not_accumulates() {
        let model = MetricsModel::new();
        let mut route = RouteRecord {
            common_name: "10.8.0.2".to_string(),
            real_address: "unknown".to_string(),
            virtual_address: "unknown".to_string(),
            last_ref_time: 100.0,
        };
        model.observe_route("a.status", &route);
        route.last_ref_time = 200.0;
        model.observe_route("a.status", &route);

        assert_eq!(
            family_value(
                &model,
                "openvpn_server_route_last_reference_time_seconds",
                "a.status"
            ),
            Some(200.0)
        );
    }
}
