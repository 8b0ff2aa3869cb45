use std::fmt::{self, Write};

use pipeline_demo_core::metrics::Collector;
use tokio::runtime::Handle;

const WORKERS: &str = "tokio_runtime_workers";
const ALIVE_TASKS: &str = "tokio_runtime_alive_tasks";
const QUEUE_DEPTH: &str = "tokio_runtime_global_queue_depth";

/// Gauges read from the Tokio runtime driving the scrape.
///
/// Outside a runtime only the HELP/TYPE lines are written.
#[derive(Debug, Default)]
pub struct RuntimeCollector;

impl RuntimeCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Collector for RuntimeCollector {
    fn family_names(&self) -> Vec<&str> {
        vec![WORKERS, ALIVE_TASKS, QUEUE_DEPTH]
    }

    fn encode(&self, out: &mut String) -> fmt::Result {
        let metrics = Handle::try_current().ok().map(|h| h.metrics());

        writeln!(out, "# HELP {WORKERS} Number of worker threads used by the runtime.")?;
        writeln!(out, "# TYPE {WORKERS} gauge")?;
        if let Some(m) = &metrics {
            writeln!(out, "{WORKERS} {}", m.num_workers())?;
        }

        writeln!(out, "# HELP {ALIVE_TASKS} Number of tasks alive in the runtime.")?;
        writeln!(out, "# TYPE {ALIVE_TASKS} gauge")?;
        if let Some(m) = &metrics {
            writeln!(out, "{ALIVE_TASKS} {}", m.num_alive_tasks())?;
        }

        writeln!(out, "# HELP {QUEUE_DEPTH} Tasks waiting in the runtime's global queue.")?;
        writeln!(out, "# TYPE {QUEUE_DEPTH} gauge")?;
        if let Some(m) = &metrics {
            writeln!(out, "{QUEUE_DEPTH} {}", m.global_queue_depth())?;
        }
        Ok(())
    }
}
