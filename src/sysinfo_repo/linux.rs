// Linux-specific helpers: /proc/cpuinfo and /etc/os-release.

/// First "model name" from /proc/cpuinfo. Preferred over sysinfo, which may report "cpu0".
pub(super) fn read_cpu_model_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|c| cpu_model_from(&c))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Distribution name from /etc/os-release, e.g. "Ubuntu 24.04.1 LTS".
pub(super) fn read_os_pretty_name() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|c| pretty_name_from(&c))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn cpu_model_from(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty() && *v != "cpu0")
        .map(String::from)
}

/// PRETTY_NAME, falling back to NAME.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn pretty_name_from(os_release: &str) -> Option<String> {
    let value = |key: &str| {
        os_release
            .lines()
            .find_map(|l| l.strip_prefix(key))
            .map(|v| v.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    };
    value("PRETTY_NAME=").or_else(|| value("NAME="))
}
