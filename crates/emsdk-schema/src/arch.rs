//! Host operating system and CPU architecture.
//!
//! Manifest entries declare which hosts they run on through free-form `os`
//! strings (`"win"`, `"linux"`, `"macos"`, `"unix"`, `"all"`) and an optional
//! `arch` string. [`Host`] is the one place that answers "does this entry
//! apply here?".
//!
//! # Example
//!
//! ```
//! use emsdk_schema::{Arch, Host, Os};
//!
//! let host = Host::new(Os::Linux, Arch::X86_64);
//! assert!(host.matches_os("unix"));
//! assert!(!host.matches_os("win"));
//! ```

/// Operating system family.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows
    Windows,
    /// Linux distributions
    #[default]
    Linux,
    /// Apple macOS
    MacOs,
}

impl Os {
    /// Get the OS this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Short name used in release download URLs (`win`, `linux`, `mac`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "win",
            Self::Linux => "linux",
            Self::MacOs => "mac",
        }
    }

    /// Whether this is a Unix flavour (Linux or macOS).
    pub fn is_unix(&self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "mac" | "darwin" => Ok(Self::MacOs),
            _ => Err(HostError::UnknownOs(s.to_string())),
        }
    }
}

/// CPU architecture.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
pub enum Arch {
    /// 32-bit Intel
    #[serde(rename = "x86")]
    X86,
    /// 64-bit Intel/AMD
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    /// 32-bit ARM
    #[serde(rename = "arm")]
    Arm,
    /// 64-bit ARM
    #[serde(rename = "arm64")]
    Arm64,
}

impl Arch {
    /// Get the architecture this binary was compiled for.
    pub fn current() -> Self {
        std::env::consts::ARCH.parse().unwrap_or_default()
    }

    /// Manifest spelling of the architecture.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
        }
    }

    /// Whether the architecture is a 64-bit one.
    pub fn is_64bit(&self) -> bool {
        matches!(self, Self::X86_64 | Self::Arm64)
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = HostError;

    /// Parses machine names the way `uname -m` and Windows report them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let machine = s.to_lowercase();
        if machine.starts_with("x64") || machine.starts_with("amd64") || machine.starts_with("x86_64")
        {
            Ok(Self::X86_64)
        } else if machine.ends_with("86") {
            Ok(Self::X86)
        } else if machine.starts_with("aarch64") || machine.starts_with("arm64") {
            Ok(Self::Arm64)
        } else if machine.starts_with("arm") {
            Ok(Self::Arm)
        } else {
            Err(HostError::UnknownArch(s.to_string()))
        }
    }
}

/// Errors raised while describing the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// `EMSDK_OS` held something other than windows, linux or macos.
    #[error("EMSDK_OS must be one of: windows, linux, macos (got '{0}')")]
    UnknownOs(String),

    /// The machine architecture is not one emsdk ships binaries for.
    #[error("unknown machine architecture: {0}")]
    UnknownArch(String),
}

/// The machine emsdk is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Host {
    /// Operating system family
    pub os: Os,
    /// CPU architecture
    pub arch: Arch,
}

impl Host {
    /// Describe an explicit host.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the running host, honouring the `EMSDK_OS` and `EMSDK_ARCH`
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if an override names an unknown OS or machine.
    pub fn detect() -> Result<Self, HostError> {
        let os = match std::env::var("EMSDK_OS") {
            Ok(v) => v.parse()?,
            Err(_) => Os::current(),
        };
        let arch = match std::env::var("EMSDK_ARCH") {
            Ok(v) => v.parse()?,
            Err(_) => Arch::current(),
        };
        Ok(Self { os, arch })
    }

    /// Whether the host is Windows.
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Whether the host can run 64-bit only packages.
    pub fn is_64bit(&self) -> bool {
        self.arch.is_64bit()
    }

    /// Separator between entries of `PATH`.
    pub fn path_separator(&self) -> char {
        if self.is_windows() { ';' } else { ':' }
    }

    /// Executable suffix (`.exe` on Windows, empty elsewhere).
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Test a manifest `arch` field against this host.
    pub fn matches_arch(&self, arch: Option<&str>) -> bool {
        arch.is_none_or(|a| a == self.arch.as_str())
    }

    /// Test a manifest `os` field against this host.
    ///
    /// `"all"` matches everything; `"unix"` matches Linux and macOS.
    pub fn matches_os(&self, os: &str) -> bool {
        if os == "all" {
            return true;
        }
        match self.os {
            Os::Windows => os.contains("win"),
            Os::Linux => os.contains("linux") || os.contains("unix"),
            Os::MacOs => os.contains("macos") || os.contains("unix"),
        }
    }
}
