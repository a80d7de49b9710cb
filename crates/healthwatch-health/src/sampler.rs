//! Host metrics sampling.
//!
//! [`ProcSampler`] reads the Linux procfs/sysfs layout. Its roots are
//! configurable so tests can point it at a fake tree.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Result type alias for sampling operations.
pub type SampleResult<T> = Result<T, SampleError>;

/// Boxed future returned by [`SystemSampler`] methods.
pub type SampleFuture<'a, T> = Pin<Box<dyn Future<Output = SampleResult<T>> + Send + 'a>>;

/// Errors raised while sampling one host metric.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unexpected format in {0}")]
    Format(String),

    #[error("{0} unavailable")]
    Unavailable(String),

    #[error("statvfs({path}) failed: {source}")]
    Statvfs {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Source of instantaneous host metrics, injected for testability.
pub trait SystemSampler: Send + Sync {
    /// CPU utilisation in percent over a short sampling window.
    fn cpu_percent(&self) -> SampleFuture<'_, f64>;

    /// Used virtual memory in percent.
    fn memory_percent(&self) -> SampleFuture<'_, f64>;

    /// Used space of the filesystem holding `path`, in percent.
    fn disk_percent<'a>(&'a self, path: &'a Path) -> SampleFuture<'a, f64>;

    /// Number of live processes.
    fn process_count(&self) -> SampleFuture<'_, u64>;

    /// CPU temperature in degrees Celsius.
    fn temperature(&self) -> SampleFuture<'_, f64>;
}

/// Samples metrics from procfs, sysfs, and `statvfs(3)`.
#[derive(Debug, Clone)]
pub struct ProcSampler {
    proc_root: PathBuf,
    thermal_zones: Vec<PathBuf>,
    cpu_window: Duration,
    /// Fall back to `vcgencmd measure_temp` when no thermal zone exists.
    use_vcgencmd: bool,
}

impl Default for ProcSampler {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            thermal_zones: vec![
                PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
                PathBuf::from("/sys/class/thermal/thermal_zone1/temp"),
            ],
            cpu_window: Duration::from_secs(1),
            use_vcgencmd: true,
        }
    }
}

impl ProcSampler {
    /// Sampler reading from custom roots (for testing).
    pub fn with_roots(
        proc_root: PathBuf,
        thermal_zones: Vec<PathBuf>,
        cpu_window: Duration,
    ) -> Self {
        Self {
            proc_root,
            thermal_zones,
            cpu_window,
            use_vcgencmd: false,
        }
    }

    async fn read(&self, path: &Path) -> SampleResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SampleError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn cpu_times(&self) -> SampleResult<CpuTimes> {
        let path = self.proc_root.join("stat");
        let content = self.read(&path).await?;
        parse_cpu_times(&content).ok_or_else(|| SampleError::Format(path.display().to_string()))
    }

    async fn read_thermal_zones(&self) -> Option<f64> {
        for zone in &self.thermal_zones {
            let Ok(content) = tokio::fs::read_to_string(zone).await else {
                continue;
            };
            if let Ok(millicelsius) = content.trim().parse::<i64>() {
                return Some(millicelsius as f64 / 1000.0);
            }
            debug!(zone = %zone.display(), "unparseable thermal zone reading");
        }
        None
    }
}

impl SystemSampler for ProcSampler {
    fn cpu_percent(&self) -> SampleFuture<'_, f64> {
        Box::pin(async move {
            let before = self.cpu_times().await?;
            tokio::time::sleep(self.cpu_window).await;
            let after = self.cpu_times().await?;
            Ok(before.usage_until(&after))
        })
    }

    fn memory_percent(&self) -> SampleFuture<'_, f64> {
        Box::pin(async move {
            let path = self.proc_root.join("meminfo");
            let content = self.read(&path).await?;
            parse_meminfo_percent(&content)
                .ok_or_else(|| SampleError::Format(path.display().to_string()))
        })
    }

    fn disk_percent<'a>(&'a self, path: &'a Path) -> SampleFuture<'a, f64> {
        Box::pin(async move {
            let owned = path.to_path_buf();
            tokio::task::spawn_blocking(move || statvfs_percent(&owned))
                .await
                .map_err(|e| SampleError::Unavailable(format!("disk usage ({e})")))?
        })
    }

    fn process_count(&self) -> SampleFuture<'_, u64> {
        Box::pin(async move {
            let read_err = |source| SampleError::Read {
                path: self.proc_root.clone(),
                source,
            };
            let mut entries = tokio::fs::read_dir(&self.proc_root).await.map_err(read_err)?;
            let mut count = 0;
            while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
                if entry.file_name().to_string_lossy().parse::<u32>().is_ok() {
                    count += 1;
                }
            }
            Ok(count)
        })
    }

    fn temperature(&self) -> SampleFuture<'_, f64> {
        Box::pin(async move {
            if let Some(celsius) = self.read_thermal_zones().await {
                return Ok(celsius);
            }
            if self.use_vcgencmd {
                return vcgencmd_temperature().await;
            }
            Err(SampleError::Unavailable("temperature sensor".to_string()))
        })
    }
}

/// Aggregate CPU jiffies from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    idle: u64,
    total: u64,
}

impl CpuTimes {
    fn usage_until(&self, later: &CpuTimes) -> f64 {
        let total = later.total.saturating_sub(self.total);
        let idle = later.idle.saturating_sub(self.idle);
        if total == 0 {
            return 0.0;
        }
        (total.saturating_sub(idle)) as f64 / total as f64 * 100.0
    }
}

/// `cpu  user nice system idle iowait irq softirq steal guest guest_nice`
///
/// Guest time is already counted in user time, so only the first eight
/// columns make up the total.
fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 4 {
        return None;
    }
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: fields.iter().sum(),
    })
}

/// Percentage of `MemTotal` not covered by `MemAvailable`.
fn parse_meminfo_percent(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find_map(|l| l.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|v| v.parse().ok())
    };
    let total = field("MemTotal")?;
    let available = field("MemAvailable")?;
    if total == 0 {
        return None;
    }
    Some(total.saturating_sub(available) as f64 / total as f64 * 100.0)
}

#[cfg(unix)]
fn statvfs_percent(path: &Path) -> SampleResult<f64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| SampleError::Format(path.display().to_string()))?;

    // SAFETY: `stat` is a plain C struct that statvfs fully initialises on
    // success; `c_path` is a valid NUL-terminated string for the call.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(SampleError::Statvfs {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    let frsize = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * frsize;
    let free = stat.f_bfree as u64 * frsize;
    if total == 0 {
        return Err(SampleError::Unavailable(format!("size of {}", path.display())));
    }
    Ok(total.saturating_sub(free) as f64 / total as f64 * 100.0)
}

#[cfg(not(unix))]
fn statvfs_percent(path: &Path) -> SampleResult<f64> {
    Err(SampleError::Unavailable(format!("disk usage of {}", path.display())))
}

/// Raspberry Pi firmware fallback: `temp=48.3'C`.
async fn vcgencmd_temperature() -> SampleResult<f64> {
    let unavailable = || SampleError::Unavailable("temperature sensor".to_string());

    let output = tokio::time::timeout(
        Duration::from_secs(5),
        tokio::process::Command::new("vcgencmd")
            .arg("measure_temp")
            .output(),
    )
    .await
    .map_err(|_| unavailable())?
    .map_err(|_| unavailable())?;

    if !output.status.success() {
        return Err(unavailable());
    }
    parse_vcgencmd(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| SampleError::Format("vcgencmd output".to_string()))
}

fn parse_vcgencmd(output: &str) -> Option<f64> {
    output
        .trim()
        .strip_prefix("temp=")?
        .trim_end_matches("'C")
        .parse()
        .ok()
}
