//! Install-time knobs collected from the command line and the environment.

use std::fmt;
use std::str::FromStr;

/// CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    Debug,
    Release,
    MinSizeRel,
    RelWithDebInfo,
}

impl BuildType {
    pub const ALL: [Self; 4] = [Self::Debug, Self::MinSizeRel, Self::RelWithDebInfo, Self::Release];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::MinSizeRel => "MinSizeRel",
            Self::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown CMake build type \"{s}\" specified! Please specify one of Debug, MinSizeRel, RelWithDebInfo, Release"
                )
            })
    }
}

/// LLVM assertion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assertions {
    /// On unless the build type is Release or MinSizeRel.
    #[default]
    Auto,
    On,
    Off,
}

impl Assertions {
    pub fn enabled_for(self, build_type: &str) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Auto => {
                let t = build_type.to_ascii_lowercase();
                t != "release" && t != "minsizerel"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Parallelism passed to the build tool.
    pub cores: usize,
    /// Keep downloaded archives and reuse them on later installs.
    pub keep_downloads: bool,
    /// Shallow git clones.
    pub shallow: bool,
    /// Overrides every item's `cmake_build_type`.
    pub build_type: Option<BuildType>,
    /// CMake generator name; empty lets CMake choose.
    pub generator: String,
    /// Build LLVM and clang tests.
    pub build_tests: bool,
    pub assertions: Assertions,
    /// Extra arguments for the LLVM configure step (`LLVM_CMAKE_ARGS`).
    pub llvm_cmake_args: Vec<String>,
    /// Base URL for relative archive names.
    pub packages_url: String,
    /// Base URL for emscripten-releases builds.
    pub releases_builds_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cores: default_cores(),
            keep_downloads: false,
            shallow: false,
            build_type: None,
            generator: "Unix Makefiles".to_string(),
            build_tests: false,
            assertions: Assertions::Auto,
            llvm_cmake_args: Vec::new(),
            packages_url: crate::PACKAGES_URL.to_string(),
            releases_builds_url: crate::RELEASES_BUILDS_URL.to_string(),
        }
    }
}

impl Settings {
    /// Defaults plus the `EMSDK_NUM_CORES`, `EMSDK_KEEP_DOWNLOADS` and
    /// `LLVM_CMAKE_ARGS` environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(cores) = std::env::var("EMSDK_NUM_CORES")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            settings.cores = cores;
        }
        settings.keep_downloads = env_flag("EMSDK_KEEP_DOWNLOADS");
        if let Ok(args) = std::env::var("LLVM_CMAKE_ARGS") {
            settings.llvm_cmake_args = split_cmake_args(&args);
        }
        settings
    }

    /// Build type for an item whose manifest declares `declared`.
    pub fn decide_build_type(&self, declared: Option<&str>) -> String {
        match self.build_type {
            Some(t) => t.to_string(),
            None => declared.unwrap_or("Release").to_string(),
        }
    }
}

/// One less than the number of CPUs, at least one.
pub fn default_cores() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// True when the variable is set to anything but empty or `0`.
pub fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| !v.is_empty() && v != "0")
}

fn split_cmake_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
