mod collectors;
mod config;
mod models;
mod util;

use anyhow::Result;
use clap::Parser;
use collectors::mountstats;
use config::Config;
use models::mount::{rtt_status, NfsMount};

#[derive(Parser, Debug)]
#[command(name = "nfsmon", about = "NFS client mount statistics inspector", version = "0.1")]
struct Cli {
    /// Read /proc/<PID>/mountstats ("self" or a numeric pid)
    #[arg(short, long)]
    pid: Option<String>,

    /// Parse this file instead of a /proc source
    #[arg(short, long)]
    file: Option<String>,

    /// Print a one-shot JSON snapshot of all NFS mount statistics and exit
    #[arg(long)]
    json: bool,

    /// Include the per-operation counter tables in the report
    #[arg(long)]
    ops: bool,

    /// Poll repeatedly and print per-interval throughput and RTT
    #[arg(short, long)]
    watch: bool,

    /// Watch interval in milliseconds (default from config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// One-shot health check: exit 0=OK, 1=SLOW, 2=DEGRADED (nagios/cron compatible)
    #[arg(long)]
    check: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load();

    if cli.config {
        return run_print_config();
    }

    let source = match (&cli.file, &cli.pid) {
        (Some(f), _)    => f.clone(),
        (None, Some(p)) => format!("/proc/{}/mountstats", p),
        (None, None)    => format!("/proc/{}/mountstats", cfg.general.pid),
    };

    if cli.json {
        return run_json_snapshot(&source, &cfg);
    }
    if cli.check {
        return run_check(&source, &cfg);
    }
    if cli.watch {
        let interval = cli.interval.unwrap_or(cfg.general.update_interval_ms);
        return run_watch(&source, &cfg, interval);
    }

    run_report(&source, &cfg, cli.ops)
}

/// Parse the source and drop excluded mountpoints. A mid-stream read error is
/// logged to stderr and reported back; whatever parsed before it is kept.
fn collect(source: &str, cfg: &Config) -> Result<(Vec<NfsMount>, bool)> {
    let (mut mounts, err) = mountstats::read_mountstats(source)?;
    let had_err = err.is_some();
    if let Some(e) = err {
        eprintln!("nfsmon: read error on {}: {}", source, e);
    }
    mounts.retain(|m| !cfg.mounts.is_excluded(&m.mountpoint));
    Ok((mounts, had_err))
}

fn run_report(source: &str, cfg: &Config, show_ops: bool) -> Result<()> {
    let (mounts, had_err) = collect(source, cfg)?;
    print!("{}", util::report::generate(&mounts, &cfg.thresholds, show_ops));
    if had_err {
        std::process::exit(1);
    }
    Ok(())
}

fn run_json_snapshot(source: &str, cfg: &Config) -> Result<()> {
    use serde_json::json;

    let (mounts, had_err) = collect(source, cfg)?;

    let snapshot = json!({
        "nfsmon_version": "0.1",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "source": source,
        "mounts": mounts,
    });

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    if had_err {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(source: &str, cfg: &Config) -> Result<()> {
    let (mounts, _) = collect(source, cfg)?;
    let t = &cfg.thresholds;

    let flagged: Vec<(&NfsMount, &'static str)> = mounts.iter()
        .map(|m| (m, m.status_str(t.rtt_warn_ms, t.rtt_crit_ms)))
        .filter(|(_, s)| *s == "SLOW" || *s == "DEGRADED")
        .collect();
    let has_crit = flagged.iter().any(|(_, s)| *s == "DEGRADED");
    let has_warn = flagged.iter().any(|(_, s)| *s == "SLOW");

    if flagged.is_empty() {
        println!("OK — {} NFS mount(s), none above RTT thresholds", mounts.len());
        std::process::exit(0);
    }

    for (m, status) in &flagged {
        println!("[{}] {} ({})  read {:.1}ms / write {:.1}ms",
            status, m.mountpoint, m.device, m.read_rtt_ms(), m.write_rtt_ms());
    }

    if has_crit {
        std::process::exit(2);
    } else if has_warn {
        std::process::exit(1);
    }
    Ok(())
}

fn run_watch(source: &str, cfg: &Config, interval_ms: u64) -> Result<()> {
    use collectors::mountstats::compute_io;
    use util::human::{fmt_ops, fmt_rate};

    let tick = std::time::Duration::from_millis(interval_ms.max(500));
    eprintln!("nfsmon watching {} (interval {}ms), Ctrl-C to stop…",
        source, tick.as_millis());

    let (mut prev, _) = collect(source, cfg)?;
    let mut prev_at = std::time::Instant::now();
    let t = &cfg.thresholds;

    loop {
        std::thread::sleep(tick);

        let (mounts, _) = match collect(source, cfg) {
            Ok(pair) => pair,
            Err(e) => {
                // Source can vanish briefly (pid exit / remount); keep ticking.
                eprintln!("nfsmon: {}", e);
                continue;
            }
        };

        let elapsed = prev_at.elapsed().as_secs_f64();
        prev_at = std::time::Instant::now();

        let now = chrono::Local::now().format("%H:%M:%S");
        if mounts.is_empty() {
            println!("{}  no NFS mounts", now);
        }
        for m in &mounts {
            let io = match prev.iter().find(|p| p.mountpoint == m.mountpoint && p.device == m.device) {
                Some(p) => compute_io(p, m, elapsed),
                None    => Default::default(),
            };
            let rtt = io.avg_read_rtt_ms.max(io.avg_write_rtt_ms);
            println!(
                "{}  {:<22} R {:>10}  W {:>10}  {:>8} rd  {:>8} wr  rtt {:>6}  {}",
                now,
                m.mountpoint,
                fmt_rate(io.read_bytes_per_sec),
                fmt_rate(io.write_bytes_per_sec),
                fmt_ops(io.read_ops_per_sec),
                fmt_ops(io.write_ops_per_sec),
                format!("{:.1}", rtt),
                rtt_status(rtt, t.rtt_warn_ms, t.rtt_crit_ms),
            );
        }

        prev = mounts;
    }
}

fn run_print_config() -> Result<()> {
    let cfg = Config::load();
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  update_interval_ms = {}", cfg.general.update_interval_ms);
    println!("  pid                = {}", cfg.general.pid);
    println!();
    println!("[thresholds]");
    println!("  rtt_warn_ms = {}ms", cfg.thresholds.rtt_warn_ms);
    println!("  rtt_crit_ms = {}ms", cfg.thresholds.rtt_crit_ms);
    println!();
    println!("[mounts]");
    if cfg.mounts.exclude.is_empty() {
        println!("  exclude = (none)");
    } else {
        println!("  exclude = {:?}", cfg.mounts.exclude);
    }
    Ok(())
}
