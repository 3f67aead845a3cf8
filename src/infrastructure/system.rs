use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, System};

use crate::domain::DomainError;

const NVIDIA_PROBES: [&str; 2] = ["/proc/driver/nvidia/version", "/dev/nvidia0"];

#[derive(Debug, Clone, Serialize)]
pub struct ProcessStats {
    /// Resident set size in MiB.
    pub mem: f64,
    /// CPU percent since the previous sample; 0 on the first one.
    pub cpu_usage: f32,
    /// OS threads of the process. sysinfo lists tasks only on Linux and
    /// Android, so this is `None` on other platforms.
    pub threads: Option<usize>,
    pub cuda_is_available: bool,
}

/// Samples resource usage of the current process.
pub struct ProcessMonitor {
    pid: Pid,
    system: Mutex<System>,
}

impl ProcessMonitor {
    pub fn new() -> Result<Self, DomainError> {
        let pid = sysinfo::get_current_pid().map_err(DomainError::internal)?;
        let mut system = System::new();
        system.refresh_process(pid);

        Ok(Self {
            pid,
            system: Mutex::new(system),
        })
    }

    pub fn sample(&self) -> ProcessStats {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_process(self.pid);

        let (rss_bytes, cpu_usage) = system
            .process(self.pid)
            .map(|p| (p.memory(), p.cpu_usage()))
            .unwrap_or_default();

        ProcessStats {
            mem: round3(rss_bytes as f64 / (1024.0 * 1024.0)),
            cpu_usage,
            threads: thread_count(self.pid),
            cuda_is_available: cuda_is_available(),
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn thread_count(pid: Pid) -> Option<usize> {
    // Task sets are only captured when sysinfo first sees a process, so a
    // fresh snapshot is taken per sample.
    let mut system = System::new();
    system.refresh_pids_specifics(&[pid], ProcessRefreshKind::new());

    // The main thread is not listed among its own tasks.
    system
        .process(pid)
        .and_then(|process| process.tasks())
        .map(|tasks| tasks.len() + 1)
}

fn cuda_is_available() -> bool {
    NVIDIA_PROBES.iter().any(|p| Path::new(p).exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reports_live_process() {
        let monitor = ProcessMonitor::new().unwrap();
        let stats = monitor.sample();

        assert!(stats.mem > 0.0);
        assert!(stats.cpu_usage >= 0.0);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_thread_count_sees_spawned_thread() {
        let monitor = ProcessMonitor::new().unwrap();
        let (release, parked) = std::sync::mpsc::channel::<()>();
        let worker = std::thread::spawn(move || parked.recv().ok());

        let threads = monitor.sample().threads.unwrap();
        assert!(threads >= 2, "expected main and spawned thread, got {threads}");

        release.send(()).unwrap();
        worker.join().unwrap();
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    #[test]
    fn test_thread_count_unknown_elsewhere() {
        assert!(ProcessMonitor::new().unwrap().sample().threads.is_none());
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
    }
}
