//! Default process metrics sampled from the host at scrape time.

use std::fmt::{self, Write};
use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, System};

use crate::error::{PipelineError, Result};
use crate::metrics::instruments::{escape_help, format_float};
use crate::metrics::registry::Collector;

const FAMILIES: [(&str, &str); 5] = [
    (
        "process_start_time_seconds",
        "Start time of the process since unix epoch in seconds.",
    ),
    (
        "process_uptime_seconds",
        "Time the process has been running in seconds.",
    ),
    (
        "process_resident_memory_bytes",
        "Resident memory size in bytes.",
    ),
    (
        "process_virtual_memory_bytes",
        "Virtual memory size in bytes.",
    ),
    (
        "process_cpu_usage_percent",
        "CPU usage of the process since the previous scrape, in percent of one core.",
    ),
];

/// Point-in-time values, in `FAMILIES` order.
fn sample_values(system: &mut System, pid: Pid) -> Option<[f64; 5]> {
    if !system.refresh_process(pid) {
        return None;
    }
    let p = system.process(pid)?;
    Some([
        p.start_time() as f64,
        p.run_time() as f64,
        p.memory() as f64,
        p.virtual_memory() as f64,
        f64::from(p.cpu_usage()),
    ])
}

/// Collects `process_*` gauges for the current process.
///
/// The `System` handle is kept between scrapes because CPU usage is computed
/// as a delta against the previous refresh.
pub struct ProcessCollector {
    pid: Pid,
    system: Mutex<System>,
}

impl ProcessCollector {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| PipelineError::Internal(format!("resolve current pid failed: {e}")))?;
        let mut system = System::new();
        system.refresh_process(pid);
        Ok(Self {
            pid,
            system: Mutex::new(system),
        })
    }
}

impl Collector for ProcessCollector {
    fn family_names(&self) -> Vec<&str> {
        FAMILIES.iter().map(|(name, _)| *name).collect()
    }

    fn encode(&self, out: &mut String) -> fmt::Result {
        let values = {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            sample_values(&mut system, self.pid)
        };
        if values.is_none() {
            tracing::warn!(pid = %self.pid, "process metrics unavailable");
        }

        for (i, (name, help)) in FAMILIES.iter().enumerate() {
            writeln!(out, "# HELP {} {}", name, escape_help(help))?;
            writeln!(out, "# TYPE {} gauge", name)?;
            if let Some(v) = values.as_ref().and_then(|vs| vs.get(i)) {
                writeln!(out, "{} {}", name, format_float(*v))?;
            }
        }
        Ok(())
    }
}
