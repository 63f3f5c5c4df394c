//! Compute device selection for training: CUDA when an NVIDIA GPU answers, CPU otherwise.

use std::path::PathBuf;
use std::process::Command;

use detkit_core::Device;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComputeDevice {
    pub device: Device,
    pub name: Option<String>,
}

impl ComputeDevice {
    pub fn cpu() -> Self {
        Self {
            device: Device::Cpu,
            name: None,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self.device, Device::Cuda { .. })
    }
}

pub trait DeviceProbe {
    fn probe(&self) -> ComputeDevice;
}

/// Asks `nvidia-smi` for the first GPU.
pub struct NvidiaSmiProbe {
    program: PathBuf,
}

impl NvidiaSmiProbe {
    pub fn new() -> Self {
        Self::with_program("nvidia-smi")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NvidiaSmiProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProbe for NvidiaSmiProbe {
    fn probe(&self) -> ComputeDevice {
        let output = match Command::new(&self.program)
            .args(["--query-gpu=name", "--format=csv,noheader"])
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                debug!(program = %self.program.display(), error = %err, "GPU probe unavailable");
                return ComputeDevice::cpu();
            }
        };
        if !output.status.success() {
            debug!(status = %output.status, "GPU probe reported no device");
            return ComputeDevice::cpu();
        }
        match parse_gpu_name(&String::from_utf8_lossy(&output.stdout)) {
            Some(name) => ComputeDevice {
                device: Device::Cuda { device_id: 0 },
                name: Some(name),
            },
            None => ComputeDevice::cpu(),
        }
    }
}

pub struct CpuOnlyProbe;

impl DeviceProbe for CpuOnlyProbe {
    fn probe(&self) -> ComputeDevice {
        ComputeDevice::cpu()
    }
}

pub fn platform_probe() -> Box<dyn DeviceProbe> {
    #[cfg(target_os = "macos")]
    {
        Box::new(CpuOnlyProbe)
    }

    #[cfg(not(target_os = "macos"))]
    {
        Box::new(NvidiaSmiProbe::new())
    }
}

/// First non-empty line of `nvidia-smi --query-gpu=name --format=csv,noheader`.
pub fn parse_gpu_name(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
