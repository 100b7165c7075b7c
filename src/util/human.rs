/// Format bytes/s into a human-readable string: "12.5 MB/s"
pub fn fmt_rate(bytes_per_sec: f64) -> String {
    fmt_bytes_f(bytes_per_sec) + "/s"
}

/// Format a raw byte count into a human-readable string: "12.5 MB"
pub fn fmt_bytes(bytes: u64) -> String {
    fmt_bytes_f(bytes as f64)
}

fn fmt_bytes_f(b: f64) -> String {
    const TB: f64 = 1_099_511_627_776.0;
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    const KB: f64 = 1_024.0;
    if b >= TB      { format!("{:.1} TB", b / TB) }
    else if b >= GB { format!("{:.1} GB", b / GB) }
    else if b >= MB { format!("{:.1} MB", b / MB) }
    else if b >= KB { format!("{:.1} KB", b / KB) }
    else            { format!("{:.0} B",  b) }
}

/// Format an RPC/op count: "1.2M", "34.1K", "512"
pub fn fmt_count(n: u64) -> String {
    if n >= 1_000_000 { format!("{:.1}M", n as f64 / 1_000_000.0) }
    else if n >= 1_000 { format!("{:.1}K", n as f64 / 1_000.0) }
    else { format!("{}", n) }
}

/// Format an ops/s rate: "1.2K/s", "87/s"
pub fn fmt_ops(ops_per_sec: f64) -> String {
    fmt_count(ops_per_sec as u64) + "/s"
}

/// Format a mount age in seconds: "45m", "3h", "12d"
pub fn fmt_age(secs: u64) -> String {
    if secs < 3600           { format!("{}m", secs / 60) }
    else if secs < 86_400    { format!("{}h", secs / 3600) }
    else                     { format!("{}d", secs / 86_400) }
}
