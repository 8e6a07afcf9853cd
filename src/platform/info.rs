use sysinfo::{CpuRefreshKind, RefreshKind, System};

use super::PlatformKind;

/// Host facts shown before the mode prompt.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub platform: &'static str,
    pub os: String,
    pub architecture: String,
    pub logical_cpus: usize,
    pub hostname: Option<String>,
}

impl SystemInfo {
    pub fn gather(kind: PlatformKind) -> Self {
        let os = os_info::get();
        let architecture = os
            .architecture()
            .map(str::to_string)
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        let sys = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::new()),
        );

        SystemInfo {
            platform: kind.display_name(),
            os: format!("{} {}", os.os_type(), os.version()),
            architecture,
            logical_cpus: sys.cpus().len(),
            hostname: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Platform: {} ({})", self.platform, self.os),
            format!("CPU Architecture: {}", self.architecture),
            format!("Logical Processor Count: {}", self.logical_cpus),
        ];
        if let Some(host) = &self.hostname {
            lines.push(format!("Host: {}", host));
        }
        lines
    }
}
