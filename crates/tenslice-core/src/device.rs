#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Placement of a tensor's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Device {
    #[default]
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu(usize),
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    /// Parse a device string (e.g., "cpu", "gpu:0").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim().to_lowercase();

        if s == "cpu" {
            return Ok(Device::Cpu);
        }

        #[cfg(feature = "gpu")]
        {
            if s == "gpu" {
                return Ok(Device::Gpu(0));
            }
            if let Some(id_str) = s.strip_prefix("gpu:") {
                return match id_str.parse::<usize>() {
                    Ok(id) => Ok(Device::Gpu(id)),
                    Err(_) => Err(format!("Invalid GPU ID: {id_str}")),
                };
            }
        }

        Err(format!("Unknown device: {s}"))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            #[cfg(feature = "gpu")]
            Device::Gpu(id) => write!(f, "gpu:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Device::parse("cpu"), Ok(Device::Cpu));
        assert_eq!(Device::parse(" CPU "), Ok(Device::Cpu));
        assert!(Device::parse("tpu").is_err());
        assert!(Device::default().is_cpu());
    }

    #[test]
    fn test_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
    }
}
