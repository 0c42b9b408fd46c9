//! Pod information report

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::process::Cmd;
use crate::core::{CommandRunner, PodEnvironment};
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::theme::Tone;

const NOT_AVAILABLE: &str = "Not Available";
const ZERO_GPU_FAQ: &str =
    "https://docs.runpod.io/references/faq#why-do-i-have-zero-gpus-assigned-to-my-pod";

static CUDA_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CUDA Version:\s*([0-9][0-9.]*)").expect("valid regex"));

/// Everything shown in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub fields: Vec<(&'static str, String)>,
    /// `None` when the pod has no GPU
    pub cuda: Option<CudaInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaInfo {
    /// Highest CUDA version the host driver supports
    pub host_max: String,
    /// CUDA toolkit installed in the pod
    pub pod: String,
}

/// Driver-supported CUDA version from `nvidia-smi` output
pub fn parse_max_cuda(nvidia_smi: &str) -> Option<String> {
    CUDA_VERSION_RE
        .captures(nvidia_smi)
        .map(|caps| caps[1].to_string())
}

/// Toolkit version from `nvcc --version`: last word of the second-to-last line
pub fn parse_nvcc_version(nvcc: &str) -> Option<String> {
    let lines: Vec<&str> = nvcc.lines().collect();
    let line = lines.len().checked_sub(2).map(|i| lines[i])?;
    line.split_whitespace().last().map(str::to_string)
}

fn probe(runner: &dyn CommandRunner, cmd: Cmd, parse: fn(&str) -> Option<String>) -> String {
    match runner.output(&cmd) {
        Ok(out) if out.success => parse(&out.stdout),
        Ok(out) => {
            tracing::debug!(command = %cmd, "probe failed: {}", out.error_detail());
            None
        }
        Err(e) => {
            tracing::debug!(command = %cmd, "probe failed: {}", e);
            None
        }
    }
    .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Collect the report
pub fn gather(env: &PodEnvironment, runner: &dyn CommandRunner) -> PodInfo {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let gpu_count = if env.has_gpu() {
        or_na(&env.gpu_count)
    } else {
        format!(
            "{} (Warning: Running with 0 GPUs)",
            env.gpu_count.as_deref().unwrap_or("0")
        )
    };

    let fields = vec![
        ("Pod ID", or_na(&env.pod_id)),
        ("Pod RAM (GB)", or_na(&env.mem_gb)),
        (
            "Public IP",
            env.public_ip
                .clone()
                .unwrap_or_else(|| "Pod does not have a Public IP".to_string()),
        ),
        ("GPU Count", gpu_count),
        ("vCPU Count", or_na(&env.cpu_count)),
        ("Datacenter ID", or_na(&env.datacenter_id)),
    ];

    let cuda = env.has_gpu().then(|| CudaInfo {
        host_max: probe(runner, Cmd::new("nvidia-smi"), parse_max_cuda),
        pod: probe(runner, Cmd::new("nvcc").arg("--version"), parse_nvcc_version),
    });

    PodInfo { fields, cuda }
}

/// Print pod information
pub fn show(app: &mut App) -> Result<()> {
    let info = gather(app.env(), app.runner());

    app.heading("Pod Information");
    app.blank();
    for (label, value) in &info.fields {
        app.bullet(Tone::Normal, format!("{}: {}", label, value));
    }

    match &info.cuda {
        Some(cuda) => {
            app.bullet(
                Tone::Normal,
                format!("Maximum CUDA Version Supported by Host (from nvidia-smi): {}", cuda.host_max),
            );
            app.bullet(Tone::Normal, format!("CUDA Version of Pod (from nvcc): {}", cuda.pod));
        }
        None => app.bullet(
            Tone::Warning,
            format!("GPU-related Information: No GPU found. For more information, visit {}", ZERO_GPU_FAQ),
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process::{CommandOutput, MockCommandRunner};
    use crate::error::PodrigError;

    const NVIDIA_SMI: &str = "\
+---------------------------------------------------------------------------------------+
| NVIDIA-SMI 535.54.03              Driver Version: 535.54.03    CUDA Version: 12.2     |
|-----------------------------------------+----------------------+----------------------+
";

    const NVCC: &str = "\
nvcc: NVIDIA (R) Cuda compiler driver
Copyright (c) 2005-2023 NVIDIA Corporation
Built on Mon_Apr__3_17:16:06_PDT_2023
Cuda compilation tools, release 12.1, V12.1.105
Build cuda_12.1.r12.1/compiler.32688072_0
";

    #[test]
    fn test_parse_max_cuda() {
        assert_eq!(parse_max_cuda(NVIDIA_SMI), Some("12.2".into()));
        assert_eq!(parse_max_cuda("no gpu here"), None);
    }

    #[test]
    fn test_parse_nvcc_version() {
        assert_eq!(parse_nvcc_version(NVCC), Some("V12.1.105".into()));
        assert_eq!(parse_nvcc_version("single line"), None);
    }

    #[test]
    fn test_zero_gpus_skips_probes() {
        // No expectations: any command would panic the mock
        let runner = MockCommandRunner::new();
        let env = PodEnvironment {
            gpu_count: Some("0".into()),
            ..PodEnvironment::default()
        };

        let info = gather(&env, &runner);
        assert!(info.cuda.is_none());
        assert!(info.fields.contains(&("GPU Count", "0 (Warning: Running with 0 GPUs)".into())));
        assert!(info.fields.contains(&("Public IP", "Pod does not have a Public IP".into())));
    }

    #[test]
    fn test_gpu_probes_and_failures() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .withf(|cmd| cmd.is(&["nvidia-smi"]))
            .returning(|_| Ok(CommandOutput::ok(NVIDIA_SMI)));
        runner
            .expect_output()
            .withf(|cmd| cmd.is(&["nvcc", "--version"]))
            .returning(|cmd| {
                Err(PodrigError::CommandSpawn {
                    command: cmd.to_string(),
                    reason: "not found".into(),
                })
            });

        let env = PodEnvironment {
            gpu_count: Some("2".into()),
            pod_id: Some("abc123".into()),
            ..PodEnvironment::default()
        };
        let info = gather(&env, &runner);

        assert_eq!(
            info.cuda,
            Some(CudaInfo {
                host_max: "12.2".into(),
                pod: NOT_AVAILABLE.into(),
            })
        );
        assert!(info.fields.contains(&("Pod ID", "abc123".into())));
        assert!(info.fields.contains(&("GPU Count", "2".into())));
    }
}
