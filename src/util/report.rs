use crate::config::Thresholds;
use crate::models::mount::NfsMount;
use crate::util::human::{fmt_age, fmt_bytes, fmt_count};

/// Generate a human-readable NFS mount report to a String.
pub fn generate(mounts: &[NfsMount], thresholds: &Thresholds, show_ops: bool) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  nfsmon — NFS Client Mounts — {}\n", now));
    out.push_str("═══════════════════════════════════════════════\n\n");

    out.push_str(&format!("── Mounts ({}) ────────────────────────────────\n", mounts.len()));
    if mounts.is_empty() {
        out.push_str("  No NFS mounts with statvers=1.1 statistics found.\n");
    } else {
        out.push_str(&format!(
            "  {:<22} {:<5} {:<26} {:>4} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
            "Mount", "Type", "Server", "Age", "R-RTT", "W-RTT", "Status", "Read", "Written"
        ));
        out.push_str(&format!("  {}\n", "─".repeat(110)));
        for m in mounts {
            out.push_str(&format!(
                "  {:<22} {:<5} {:<26} {:>4} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
                m.mountpoint,
                m.fstype(),
                truncate(&m.device, 26),
                fmt_age(m.stats.age_secs),
                rtt_label(m.read_rtt_ms()),
                rtt_label(m.write_rtt_ms()),
                m.status_str(thresholds.rtt_warn_ms, thresholds.rtt_crit_ms),
                fmt_bytes(m.stats.bytes.server_read_bytes),
                fmt_bytes(m.stats.bytes.server_write_bytes),
            ));
        }
    }
    out.push('\n');

    if show_ops {
        for m in mounts {
            out.push_str(&format!(
                "── Operations: {} ({}) ────────────────────────\n",
                m.mountpoint,
                fmt_count(m.stats.operations.values().map(|c| c.requests).sum())
            ));
            out.push_str(&format!(
                "  {:<16} {:>9} {:>8} {:>8} {:>10} {:>10} {:>9} {:>9} {:>9}\n",
                "Op", "Requests", "Retrans", "Timeout", "Sent", "Recv", "Queue ms", "RTT ms", "Exec ms"
            ));
            out.push_str(&format!("  {}\n", "─".repeat(96)));

            // Busiest operations first; the map itself is unordered.
            let mut ops: Vec<_> = m.stats.operations.iter().collect();
            ops.sort_by(|a, b| b.1.requests.cmp(&a.1.requests).then(a.0.cmp(b.0)));

            for (name, c) in ops {
                out.push_str(&format!(
                    "  {:<16} {:>9} {:>8} {:>8} {:>10} {:>10} {:>9} {:>9} {:>9}\n",
                    name,
                    fmt_count(c.requests),
                    fmt_count(c.retransmissions()),
                    fmt_count(c.timeouts),
                    fmt_bytes(c.bytes_sent),
                    fmt_bytes(c.bytes_received),
                    c.total_queue_time,
                    c.total_response_time,
                    c.total_execution_time,
                ));
            }
            out.push('\n');
        }
    }

    out.push_str("═══════════════════════════════════════════════\n");
    out
}

fn rtt_label(rtt_ms: f64) -> String {
    if rtt_ms == 0.0        { "—".to_string() }
    else if rtt_ms < 1.0    { format!("{:.2}ms", rtt_ms) }
    else                    { format!("{:.1}ms", rtt_ms) }
}

/// Truncate long server names to keep the table aligned.
fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}…", &s[..max - 1])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mount::{OperationCounters, Statistics};

    fn sample_mount() -> NfsMount {
        let mut stats = Statistics::default();
        stats.age_secs = 7200;
        stats.bytes.server_read_bytes = 2048;
        stats.operations.insert("READ".into(), OperationCounters {
            requests: 10,
            transmissions: 12,
            total_response_time: 30,
            ..Default::default()
        });
        NfsMount { device: "srv:/export".into(), mountpoint: "/mnt".into(), version: 4, stats }
    }

    #[test]
    fn report_lists_mounts() {
        let text = generate(&[sample_mount()], &Thresholds::default(), false);
        assert!(text.contains("Mounts (1)"));
        assert!(text.contains("/mnt"));
        assert!(text.contains("srv:/export"));
        assert!(text.contains("nfs4"));
        assert!(text.contains("2h"));
        assert!(!text.contains("Operations:"));
    }

    #[test]
    fn report_includes_ops_when_asked() {
        let text = generate(&[sample_mount()], &Thresholds::default(), true);
        assert!(text.contains("Operations: /mnt"));
        assert!(text.contains("READ"));
    }

    #[test]
    fn empty_report_says_so() {
        let text = generate(&[], &Thresholds::default(), false);
        assert!(text.contains("No NFS mounts"));
    }

    #[test]
    fn long_server_names_are_truncated() {
        let t = truncate("a-very-long-server-name.example.org:/export/data", 26);
        assert!(t.ends_with('…'));
        assert_eq!(t.chars().count(), 26);
    }
}
