//! Readers for the Linux `/proc/self` tree.
//!
//! Every reader returns `None` (or an empty list) where `/proc` is absent, so
//! callers degrade to partial artifacts instead of failing.

use serde::Serialize;

/// CPU accounting for the whole process, from `/proc/self/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStat {
    pub user_ticks: u64,
    pub system_ticks: u64,
    pub threads: u64,
}

/// Memory figures from `/proc/self/status`, in kB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStatus {
    pub resident_kb: Option<u64>,
    pub peak_resident_kb: Option<u64>,
    pub virtual_kb: Option<u64>,
    pub data_kb: Option<u64>,
}

/// One OS thread of this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadInfo {
    pub tid: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voluntary_switches: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub involuntary_switches: Option<u64>,
}

/// Parse the contents of a `stat` file.
///
/// The command name (field 2) may contain spaces and parentheses, so fields
/// are counted from the last `)`.
pub fn parse_stat(content: &str) -> Option<ProcessStat> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();

    // fields[0] is field 3 (state).
    Some(ProcessStat {
        user_ticks: fields.get(11)?.parse().ok()?,
        system_ticks: fields.get(12)?.parse().ok()?,
        threads: fields.get(17)?.parse().ok()?,
    })
}

/// Find a numeric `Key:   value [kB]` line in a `status` file.
pub fn parse_status_field(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name != key {
            return None;
        }
        value.split_whitespace().next()?.parse().ok()
    })
}

pub fn parse_memory_status(content: &str) -> MemoryStatus {
    MemoryStatus {
        resident_kb: parse_status_field(content, "VmRSS"),
        peak_resident_kb: parse_status_field(content, "VmHWM"),
        virtual_kb: parse_status_field(content, "VmSize"),
        data_kb: parse_status_field(content, "VmData"),
    }
}

#[cfg(target_os = "linux")]
pub fn process_stat() -> Option<ProcessStat> {
    std::fs::read_to_string("/proc/self/stat")
        .ok()
        .and_then(|content| parse_stat(&content))
}

#[cfg(not(target_os = "linux"))]
pub fn process_stat() -> Option<ProcessStat> {
    None
}

#[cfg(target_os = "linux")]
pub fn memory_status() -> Option<MemoryStatus> {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .map(|content| parse_memory_status(&content))
}

#[cfg(not(target_os = "linux"))]
pub fn memory_status() -> Option<MemoryStatus> {
    None
}

/// List the process's threads, sorted by tid.
#[cfg(target_os = "linux")]
pub fn threads() -> Vec<ThreadInfo> {
    let entries = match std::fs::read_dir("/proc/self/task") {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, "Cannot list /proc/self/task");
            return Vec::new();
        }
    };

    let mut threads: Vec<ThreadInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let tid: u32 = entry.file_name().to_str()?.parse().ok()?;
            let dir = entry.path();
            let name = std::fs::read_to_string(dir.join("comm"))
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default();
            let status = std::fs::read_to_string(dir.join("status")).unwrap_or_default();

            Some(ThreadInfo {
                tid,
                name,
                voluntary_switches: parse_status_field(&status, "voluntary_ctxt_switches"),
                involuntary_switches: parse_status_field(&status, "nonvoluntary_ctxt_switches"),
            })
        })
        .collect();

    threads.sort_by_key(|t| t.tid);
    threads
}

#[cfg(not(target_os = "linux"))]
pub fn threads() -> Vec<ThreadInfo> {
    Vec::new()
}
