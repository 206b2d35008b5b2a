use std::path::Path;

/// Host flavours the packager ships prebuilt tools for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    #[value(name = "windows")]
    Windows,
    #[value(name = "raspberry-pi")]
    RaspberryPi,
    #[value(name = "linux")]
    Linux,
}

/// Source of the system files platform detection looks at.
pub trait PlatformProbe {
    /// Contents of `path`, or `None` when it does not exist or is unreadable.
    fn read(&self, path: &Path) -> Option<String>;
}

pub struct HostProbe;

impl PlatformProbe for HostProbe {
    fn read(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Self::detect_unix(&HostProbe)
        }
    }

    pub fn detect_unix<P: PlatformProbe>(probe: &P) -> Self {
        if is_pi(probe) {
            Platform::RaspberryPi
        } else {
            Platform::Linux
        }
    }

    /// Directory name under `packager_tools/`.
    pub fn tools_subdir(self) -> &'static str {
        match self {
            Platform::Windows => "win",
            Platform::RaspberryPi => "pi",
            Platform::Linux => "centos7",
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }
}

// cpuinfo is authoritative when present; os-release is only a fallback.
fn is_pi<P: PlatformProbe>(probe: &P) -> bool {
    if let Some(cpuinfo) = probe.read(Path::new("/proc/cpuinfo")) {
        return cpuinfo.contains("Raspberry Pi");
    }
    match probe.read(Path::new("/etc/os-release")) {
        Some(os_info) => {
            let os_info = os_info.to_lowercase();
            os_info.contains("raspbian") || os_info.contains("raspberry")
        }
        None => false,
    }
}
