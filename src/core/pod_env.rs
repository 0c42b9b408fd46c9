//! Pod environment detection
//!
//! The hosting platform describes the pod through environment variables.

use std::env;

/// Values the platform injects into the pod's environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodEnvironment {
    pub pod_id: Option<String>,
    pub mem_gb: Option<String>,
    pub public_ip: Option<String>,
    /// Public port mapped to the pod's port 22
    pub ssh_port: Option<String>,
    pub gpu_count: Option<String>,
    pub datacenter_id: Option<String>,
    pub cpu_count: Option<String>,
}

impl PodEnvironment {
    /// Read from the process environment
    pub fn detect() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            pod_id: get("RUNPOD_POD_ID"),
            mem_gb: get("RUNPOD_MEM_GB"),
            public_ip: get("RUNPOD_PUBLIC_IP"),
            ssh_port: get("RUNPOD_TCP_PORT_22"),
            gpu_count: get("RUNPOD_GPU_COUNT"),
            datacenter_id: get("RUNPOD_DC_ID"),
            cpu_count: get("RUNPOD_CPU_COUNT"),
        }
    }

    /// Whether the pod has at least one GPU assigned
    pub fn has_gpu(&self) -> bool {
        self.gpu_count
            .as_deref()
            .and_then(|c| c.trim().parse::<u32>().ok())
            .is_some_and(|c| c > 0)
    }

    /// Names of the variables SSH access depends on that are unset
    pub fn missing_ssh_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.public_ip.is_none() {
            missing.push("RUNPOD_PUBLIC_IP");
        }
        if self.ssh_port.is_none() {
            missing.push("RUNPOD_TCP_PORT_22");
        }
        missing
    }

    /// Public address and port for SSH, when both are known
    pub fn ssh_endpoint(&self) -> Option<(&str, &str)> {
        Some((self.public_ip.as_deref()?, self.ssh_port.as_deref()?))
    }
}
