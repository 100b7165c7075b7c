use crate::models::mount::{
    ByteCounters, EventCounters, NfsMount, OperationCounters, Statistics, TransportCounters,
};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Open and parse /proc/[pid]/mountstats (or any file in the same format).
/// The inner Option carries a mid-stream read error; mounts decoded before
/// the failure are still present.
pub fn read_mountstats(path: &str) -> Result<(Vec<NfsMount>, Option<io::Error>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    Ok(parse(BufReader::new(file)))
}

/// Decode a mountstats stream into NFS mount records.
///
/// Only statvers=1.1 entries for fstype nfs/nfs4 produce records. Header
/// lines that fail the shape test are dropped and their statistics block is
/// consumed by the same top-level scan, which reacts to nothing but further
/// "device" lines. Malformed counter lines are skipped, bad numeric tokens
/// decode as zero; the only fatal condition is a reader error.
pub fn parse<R: BufRead>(reader: R) -> (Vec<NfsMount>, Option<io::Error>) {
    let mut lines = LineSource::new(reader);
    let mut mounts = Vec::new();

    loop {
        let line = match lines.next_line() {
            Ok(Some(l)) => l,
            Ok(None) => return (mounts, None),
            Err(e) => return (mounts, Some(e)),
        };

        // EXAMPLE 1: "device /dev/sdb1 mounted on /boot with fstype ext2"
        // EXAMPLE 2: "device 10.0.0.5:/srv mounted on /data with fstype nfs statvers=1.1"
        // Plain mounts have 8 fields; mounts with stats carry a 9th "statvers=..." field.
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() != Some(&"device") { continue; }
        if fields.len() != 9 { continue; }
        if fields[7] != "nfs" && fields[7] != "nfs4" { continue; }
        if fields[8] != "statvers=1.1" { continue; }

        let version = if fields[7] == "nfs4" { 4 } else { 3 };
        let device = fields[1].to_string();
        let mountpoint = fields[4].to_string();

        match parse_statistics(&mut lines) {
            Ok(stats) => mounts.push(NfsMount { device, mountpoint, version, stats }),
            Err(e) => return (mounts, Some(e)),
        }
    }
}

/// Fixed counter lines between a mount header and its per-op table.
fn parse_statistics<R: BufRead>(lines: &mut LineSource<R>) -> io::Result<Statistics> {
    let mut stats = Statistics::default();

    while let Some(line) = lines.next_line()? {
        let fields: Vec<&str> = line.split_whitespace().collect();

        // A blank line or the "per-op statistics" marker ends the fixed block.
        if fields.is_empty() || fields[0] == "per-op" { break; }

        match fields[0] {
            "age:" => {
                stats.age_secs = fields.get(1).map(|s| parse_u64(s)).unwrap_or(0);
            }

            "bytes:" => {
                // There must be 9 byte elements
                if fields.len() != 9 { continue; }
                let v = to_u64(&fields[1..]);
                stats.bytes = ByteCounters {
                    normal_read_bytes:  v[0],
                    normal_write_bytes: v[1],
                    direct_read_bytes:  v[2],
                    direct_write_bytes: v[3],
                    server_read_bytes:  v[4],
                    server_write_bytes: v[5],
                    read_pages:         v[6],
                    write_pages:        v[7],
                };
            }

            "events:" => {
                // There must be 28 event elements
                if fields.len() != 28 { continue; }
                let v = to_u64(&fields[1..]);
                stats.events = EventCounters {
                    inode_revalidate:  v[0],
                    dentry_revalidate: v[1],
                    data_invalidate:   v[2],
                    attr_invalidate:   v[3],
                    vfs_open:          v[4],
                    vfs_lookup:        v[5],
                    vfs_access:        v[6],
                    vfs_update_page:   v[7],
                    vfs_read_page:     v[8],
                    vfs_read_pages:    v[9],
                    vfs_write_page:    v[10],
                    vfs_write_pages:   v[11],
                    vfs_getdents:      v[12],
                    vfs_setattr:       v[13],
                    vfs_flush:         v[14],
                    vfs_fsync:         v[15],
                    vfs_lock:          v[16],
                    vfs_release:       v[17],
                    congestion_wait:   v[18],
                    setattr_trunc:     v[19],
                    extend_write:      v[20],
                    silly_rename:      v[21],
                    short_read:        v[22],
                    short_write:       v[23],
                    delay:             v[24],
                    pnfs_read:         v[25],
                    pnfs_write:        v[26],
                };
            }

            "xprt:" => {
                // UDP mounts report a different shape; only TCP is decoded.
                if fields.get(1) != Some(&"tcp") { continue; }
                if fields.len() != 15 { continue; }
                let v = to_u64(&fields[2..]);
                stats.xprt = TransportCounters {
                    source_port:               v[0],
                    bind_count:                v[1],
                    connect_count:             v[2],
                    connect_time:              v[3],
                    idle_time:                 v[4],
                    rpc_sends:                 v[5],
                    rpc_receives:              v[6],
                    bad_xids:                  v[7],
                    request_utilization:       v[8],
                    backlog_utilization:       v[9],
                    max_slots_used:            v[10],
                    sending_queue_utilization: v[11],
                    pending_queue_utilization: v[12],
                };
            }

            // "opts:", "caps:", "sec:", unknown counters: not an error.
            _ => {}
        }
    }

    parse_operations(lines, &mut stats)?;
    Ok(stats)
}

/// Per-op table rows, e.g. "READ: 10 10 0 100 200 1 2 3".
fn parse_operations<R: BufRead>(
    lines: &mut LineSource<R>,
    stats: &mut Statistics,
) -> io::Result<()> {
    while let Some(line) = lines.next_line()? {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.is_empty() { break; }

        // The next mount header ends the table. Hand it back so the
        // top-level scan can start the next record from it.
        if fields[0] == "device" {
            lines.push_back(line);
            break;
        }

        if fields.len() != 9 { continue; }

        let name = fields[0].trim_end_matches(':').to_string();
        let v = to_u64(&fields[1..]);
        stats.operations.insert(name, OperationCounters {
            requests:             v[0],
            transmissions:        v[1],
            timeouts:             v[2],
            bytes_sent:           v[3],
            bytes_received:       v[4],
            total_queue_time:     v[5],
            total_response_time:  v[6],
            total_execution_time: v[7],
        });
    }

    Ok(())
}

fn parse_u64(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

fn to_u64(fields: &[&str]) -> Vec<u64> {
    fields.iter().map(|f| parse_u64(f)).collect()
}

/// Line reader with a one-line pushback slot. The operations parser uses the
/// slot to return a mount-boundary line it recognized but must not consume.
struct LineSource<R: BufRead> {
    inner:    R,
    pushback: Option<String>,
    buf:      String,
}

impl<R: BufRead> LineSource<R> {
    fn new(inner: R) -> Self {
        Self { inner, pushback: None, buf: String::new() }
    }

    /// Next logical line without its trailing newline; Ok(None) at end of stream.
    fn next_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.pushback.take() {
            return Ok(Some(line));
        }
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn push_back(&mut self, line: String) {
        self.pushback = Some(line);
    }
}

// ── Watch-mode rates ──────────────────────────────────────────────────

/// Computed per-mount rates over one watch interval.
#[derive(Debug, Clone, Default)]
pub struct MountIO {
    pub read_bytes_per_sec:  f64,
    pub write_bytes_per_sec: f64,
    pub read_ops_per_sec:    f64,
    pub write_ops_per_sec:   f64,
    pub retrans_per_sec:     f64,
    pub avg_read_rtt_ms:     f64,   // interval average, not lifetime
    pub avg_write_rtt_ms:    f64,
}

/// Compute delta rates for one mount given two snapshots and the elapsed seconds.
pub fn compute_io(prev: &NfsMount, curr: &NfsMount, elapsed_sec: f64) -> MountIO {
    if elapsed_sec <= 0.0 {
        return MountIO::default();
    }

    let zero = OperationCounters::default();
    let pr = prev.op("READ").unwrap_or(&zero);
    let cr = curr.op("READ").unwrap_or(&zero);
    let pw = prev.op("WRITE").unwrap_or(&zero);
    let cw = curr.op("WRITE").unwrap_or(&zero);

    let d_reads   = cr.requests.saturating_sub(pr.requests);
    let d_writes  = cw.requests.saturating_sub(pw.requests);
    let d_read_b  = curr.stats.bytes.server_read_bytes.saturating_sub(prev.stats.bytes.server_read_bytes);
    let d_write_b = curr.stats.bytes.server_write_bytes.saturating_sub(prev.stats.bytes.server_write_bytes);
    let d_r_rtt   = cr.total_response_time.saturating_sub(pr.total_response_time);
    let d_w_rtt   = cw.total_response_time.saturating_sub(pw.total_response_time);
    let d_retrans = (cr.retransmissions() + cw.retransmissions())
        .saturating_sub(pr.retransmissions() + pw.retransmissions());

    MountIO {
        read_bytes_per_sec:  d_read_b as f64 / elapsed_sec,
        write_bytes_per_sec: d_write_b as f64 / elapsed_sec,
        read_ops_per_sec:    d_reads as f64 / elapsed_sec,
        write_ops_per_sec:   d_writes as f64 / elapsed_sec,
        retrans_per_sec:     d_retrans as f64 / elapsed_sec,
        avg_read_rtt_ms:  if d_reads  > 0 { d_r_rtt as f64 / d_reads as f64 }  else { 0.0 },
        avg_write_rtt_ms: if d_writes > 0 { d_w_rtt as f64 / d_writes as f64 } else { 0.0 },
    }
}
