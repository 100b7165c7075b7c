use serde::Serialize;
use std::collections::HashMap;

/// One NFS/NFS4 mount entry from /proc/[pid]/mountstats (statvers=1.1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NfsMount {
    pub device:     String,   // "server:/export"
    pub mountpoint: String,   // "/mnt/nfs"
    pub version:    u64,      // 3 or 4
    pub stats:      Statistics,
}

/// Everything the kernel reports below a mount header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub age_secs:   u64,
    pub bytes:      ByteCounters,
    pub events:     EventCounters,
    pub xprt:       TransportCounters,
    pub operations: HashMap<String, OperationCounters>,
}

/// "bytes:" line (linux/nfs_iostat.h: nfs_stat_bytecounters).
/// NORMAL = read(2)/write(2) traffic, DIRECT = O_DIRECT, SERVER = wire bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ByteCounters {
    pub normal_read_bytes:  u64,
    pub normal_write_bytes: u64,
    pub direct_read_bytes:  u64,
    pub direct_write_bytes: u64,
    pub server_read_bytes:  u64,
    pub server_write_bytes: u64,
    pub read_pages:         u64,
    pub write_pages:        u64,
}

/// "events:" line (linux/nfs_iostat.h: nfs_stat_eventcounters).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventCounters {
    pub inode_revalidate:  u64,
    pub dentry_revalidate: u64,
    pub data_invalidate:   u64,
    pub attr_invalidate:   u64,
    pub vfs_open:          u64,
    pub vfs_lookup:        u64,
    pub vfs_access:        u64,
    pub vfs_update_page:   u64,
    pub vfs_read_page:     u64,
    pub vfs_read_pages:    u64,
    pub vfs_write_page:    u64,
    pub vfs_write_pages:   u64,
    pub vfs_getdents:      u64,
    pub vfs_setattr:       u64,
    pub vfs_flush:         u64,
    pub vfs_fsync:         u64,
    pub vfs_lock:          u64,
    pub vfs_release:       u64,
    pub congestion_wait:   u64,
    pub setattr_trunc:     u64,
    pub extend_write:      u64,
    pub silly_rename:      u64,
    pub short_read:        u64,
    pub short_write:       u64,
    pub delay:             u64,
    pub pnfs_read:         u64,
    pub pnfs_write:        u64,
}

/// "xprt: tcp" line (linux/net/sunrpc/xprtsock.c: xs_tcp_print_stats).
/// UDP transports do not report this shape and are left at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransportCounters {
    pub source_port:               u64,
    pub bind_count:                u64,
    pub connect_count:             u64,
    pub connect_time:              u64,
    pub idle_time:                 u64,
    pub rpc_sends:                 u64,
    pub rpc_receives:              u64,
    pub bad_xids:                  u64,
    pub request_utilization:       u64,
    pub backlog_utilization:       u64,
    pub max_slots_used:            u64,
    pub sending_queue_utilization: u64,
    pub pending_queue_utilization: u64,
}

/// One row of the per-op table (linux/net/sunrpc/stats.c).
/// Times are cumulative milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationCounters {
    pub requests:             u64,
    pub transmissions:        u64,
    pub timeouts:             u64,
    pub bytes_sent:           u64,
    pub bytes_received:       u64,
    pub total_queue_time:     u64,
    pub total_response_time:  u64,
    pub total_execution_time: u64,
}

impl NfsMount {
    pub fn fstype(&self) -> &'static str {
        if self.version == 4 { "nfs4" } else { "nfs" }
    }

    pub fn op(&self, name: &str) -> Option<&OperationCounters> {
        self.stats.operations.get(name)
    }

    /// Average RTT of one operation in milliseconds (0.0 if never issued).
    pub fn avg_rtt_ms(&self, name: &str) -> f64 {
        match self.op(name) {
            Some(c) if c.requests > 0 => c.total_response_time as f64 / c.requests as f64,
            _ => 0.0,
        }
    }

    pub fn read_rtt_ms(&self) -> f64  { self.avg_rtt_ms("READ") }
    pub fn write_rtt_ms(&self) -> f64 { self.avg_rtt_ms("WRITE") }

    /// Health label against the configured RTT thresholds.
    pub fn status_str(&self, warn_ms: f64, crit_ms: f64) -> &'static str {
        rtt_status(self.read_rtt_ms().max(self.write_rtt_ms()), warn_ms, crit_ms)
    }
}

impl OperationCounters {
    /// Transmissions beyond the first attempt of each request.
    pub fn retransmissions(&self) -> u64 {
        self.transmissions.saturating_sub(self.requests)
    }
}

/// Classify an average RTT: "—" idle, then OK / SLOW / DEGRADED.
pub fn rtt_status(rtt_ms: f64, warn_ms: f64, crit_ms: f64) -> &'static str {
    if rtt_ms == 0.0          { "—" }
    else if rtt_ms < warn_ms  { "OK" }
    else if rtt_ms < crit_ms  { "SLOW" }
    else                      { "DEGRADED" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount_with_op(name: &str, c: OperationCounters) -> NfsMount {
        let mut stats = Statistics::default();
        stats.operations.insert(name.to_string(), c);
        NfsMount {
            device: "srv:/export".into(),
            mountpoint: "/mnt".into(),
            version: 3,
            stats,
        }
    }

    #[test]
    fn fstype_follows_version() {
        let mut m = mount_with_op("READ", OperationCounters::default());
        assert_eq!(m.fstype(), "nfs");
        m.version = 4;
        assert_eq!(m.fstype(), "nfs4");
    }

    #[test]
    fn avg_rtt_divides_by_requests() {
        let m = mount_with_op("READ", OperationCounters {
            requests: 10,
            total_response_time: 25,
            ..Default::default()
        });
        assert_eq!(m.read_rtt_ms(), 2.5);
        assert_eq!(m.write_rtt_ms(), 0.0);
        assert_eq!(m.avg_rtt_ms("GETATTR"), 0.0);
    }

    #[test]
    fn zero_requests_never_divides() {
        let m = mount_with_op("READ", OperationCounters {
            requests: 0,
            total_response_time: 99,
            ..Default::default()
        });
        assert_eq!(m.read_rtt_ms(), 0.0);
    }

    #[test]
    fn status_ladder() {
        assert_eq!(rtt_status(0.0, 5.0, 50.0), "—");
        assert_eq!(rtt_status(1.0, 5.0, 50.0), "OK");
        assert_eq!(rtt_status(12.0, 5.0, 50.0), "SLOW");
        assert_eq!(rtt_status(120.0, 5.0, 50.0), "DEGRADED");
    }

    #[test]
    fn retransmissions_saturate() {
        let c = OperationCounters { requests: 10, transmissions: 13, ..Default::default() };
        assert_eq!(c.retransmissions(), 3);
        let c = OperationCounters { requests: 10, transmissions: 4, ..Default::default() };
        assert_eq!(c.retransmissions(), 0);
    }
}
