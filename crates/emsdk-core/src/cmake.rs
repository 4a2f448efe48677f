//! Source builds through CMake: generator selection, build directory naming,
//! the [`Builder`] collaborator and the per-tool build recipes.

use crate::Reporter;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fsutil::{copy_executable, remove_tree, replace_dir};
use crate::git::Vcs;
use crate::item::Item;
use emsdk_schema::{Arch, Host, Os};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Build directory suffix for a generator. Unix Makefiles get none.
pub fn generator_prefix(generator: &str) -> &'static str {
    match generator {
        "Visual Studio 17" => "_vs2022",
        "Visual Studio 16" => "_vs2019",
        "MinGW Makefiles" => "_mingw",
        _ => "",
    }
}

/// Generator to use when none is requested.
///
/// Windows prefers the newest Visual Studio found by `vswhere`, then MinGW;
/// an empty string lets CMake decide.
pub fn default_generator(host: &Host) -> String {
    if !host.is_windows() {
        return "Unix Makefiles".to_string();
    }
    if vswhere(17, host.arch).is_some() {
        "Visual Studio 17".to_string()
    } else if vswhere(16, host.arch).is_some() {
        "Visual Studio 16".to_string()
    } else if which::which("mingw32-make").is_ok() && which::which("g++").is_ok() {
        "MinGW Makefiles".to_string()
    } else {
        String::new()
    }
}

/// Installation path of a Visual Studio with the given major version.
fn vswhere(version: u32, arch: Arch) -> Option<String> {
    let program_files = std::env::var("ProgramFiles(x86)")
        .or_else(|_| std::env::var("ProgramFiles"))
        .ok()?;
    let exe = Path::new(&program_files).join("Microsoft Visual Studio/Installer/vswhere.exe");
    let tools_arch = if arch == Arch::Arm64 { "ARM64" } else { "x86.x64" };
    let output = Command::new(exe)
        .args(["-latest", "-products", "*", "-prerelease", "-version"])
        .arg(format!("[{version}.0,{}.0)", version + 1))
        .arg("-requires")
        .arg(format!("Microsoft.VisualStudio.Component.VC.Tools.{tools_arch}"))
        .args(["-property", "installationPath", "-format", "json"])
        .output()
        .ok()?;
    let found: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    found
        .get(0)?
        .get("installationPath")?
        .as_str()
        .map(str::to_string)
}

/// MSBuild platform directory, or empty when MSBuild is absent.
pub fn msbuild_platforms_dir() -> String {
    let program_files = std::env::var("ProgramFiles").unwrap_or_else(|_| "C:/Program Files".to_string());
    let program_files_x86 =
        std::env::var("ProgramFiles(x86)").unwrap_or_else(|_| "C:/Program Files (x86)".to_string());
    [program_files_x86, program_files]
        .iter()
        .map(|p| Path::new(p).join("MSBuild/Microsoft.Cpp/v4.0/Platforms"))
        .find(|p| p.exists())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Name of the build directory inside a source-built tool's install path.
pub fn llvm_build_dir(ctx: &Context, item: &Item) -> String {
    let bitness = if item.def.bitness == Some(32) { "_32" } else { "_64" };
    let base = match &item.def.git_branch {
        Some(branch) => branch.replace(std::path::MAIN_SEPARATOR, "-"),
        None => item.def.version.clone(),
    };
    format!("build_{base}{}{bitness}", generator_prefix(&ctx.settings.generator))
}

/// Directory the compiled binaries land in, relative to the install path.
pub fn llvm_build_bin_dir(ctx: &Context, item: &Item) -> PathBuf {
    let build_dir = PathBuf::from(llvm_build_dir(ctx, item));
    if !(ctx.host.is_windows() && ctx.settings.generator.contains("Visual Studio")) {
        return build_dir.join("bin");
    }
    let install = item.installation_path(ctx);
    let build_type = item.build_type(ctx);
    let clang = format!("clang{}", ctx.host.exe_suffix());
    let candidates = [build_type.as_str(), "Release", "RelWithDebInfo", "MinSizeRel", "Debug"];
    if let Some(dir) = candidates
        .iter()
        .map(|t| build_dir.join(t).join("bin"))
        .find(|d| install.join(d).join(&clang).is_file())
    {
        return dir;
    }
    let old = build_dir.join("bin").join(&build_type);
    if install.join(&old).exists() {
        return old;
    }
    build_dir.join(build_type).join("bin")
}

/// Out-of-tree build directory of binaryen, next to its install path.
pub fn binaryen_build_root(ctx: &Context, item: &Item) -> PathBuf {
    let path = item.installation_path(ctx);
    let base = path.to_string_lossy();
    let base = base.trim().trim_end_matches(['/', '\\']);
    let bits = item.def.bitness.unwrap_or(64);
    PathBuf::from(format!(
        "{base}{}_{bits}bit_binaryen",
        generator_prefix(&ctx.settings.generator)
    ))
}

fn target_platform(item: &Item, host: &Host) -> &'static str {
    match item.def.arch.as_deref() {
        Some("arm64") => return "ARM64",
        Some("x86_64") => return "x64",
        Some("x86") => return "Win32",
        _ => {}
    }
    if host.arch == Arch::Arm64 {
        "ARM64"
    } else if item.def.bitness == Some(64) {
        "x64"
    } else {
        "Win32"
    }
}

fn host_platform(host: &Host) -> &'static str {
    match host.arch {
        Arch::Arm64 => "ARM64",
        Arch::Arm => "ARM",
        Arch::X86_64 => "x64",
        Arch::X86 => "x86",
    }
}

/// Generator name and the platform arguments it needs.
pub fn generator_and_config_args(ctx: &Context, item: &Item) -> (String, Vec<String>) {
    let generator = &ctx.settings.generator;
    if generator.contains("Visual Studio 16") || generator.contains("Visual Studio 17") {
        let args = vec![
            "-A".to_string(),
            target_platform(item, &ctx.host).to_string(),
            format!("-Thost={}", host_platform(&ctx.host)),
        ];
        (generator.clone(), args)
    } else if generator.contains("Visual Studio") && item.def.bitness == Some(64) {
        (format!("{generator} Win64"), vec!["-Thost=x64".to_string()])
    } else {
        (generator.clone(), Vec::new())
    }
}

/// One configure-and-build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmakeJob {
    pub generator: String,
    pub src_root: PathBuf,
    pub build_root: PathBuf,
    pub build_type: String,
    pub args: Vec<String>,
    pub cores: usize,
}

impl CmakeJob {
    pub fn new(ctx: &Context, item: &Item, src_root: PathBuf, build_root: PathBuf) -> Self {
        let (generator, args) = generator_and_config_args(ctx, item);
        Self {
            generator,
            src_root,
            build_root,
            build_type: item.build_type(ctx),
            args,
            cores: ctx.settings.cores,
        }
    }

    /// Full `cmake` configure command line, program name first.
    pub fn configure_command(&self) -> Vec<String> {
        let mut cmd = vec!["cmake".to_string()];
        if !self.generator.is_empty() {
            cmd.push("-G".to_string());
            cmd.push(self.generator.clone());
        }
        cmd.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        cmd.push("-DCMAKE_OSX_DEPLOYMENT_TARGET=11.0".to_string());
        cmd.extend(self.args.iter().cloned());
        cmd.push(self.src_root.to_string_lossy().into_owned());
        cmd
    }

    /// `cmake --build` command line, program name first.
    pub fn build_command(&self) -> Vec<String> {
        let mut cmd: Vec<String> = ["cmake", "--build", ".", "--config", self.build_type.as_str()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cores = self.cores.to_string();
        if self.generator.contains("Visual Studio") {
            cmd.extend(["-j".to_string(), cores.clone(), "--".to_string(), format!("/p:CL_MPCount={cores}")]);
        } else {
            cmd.extend(["--".to_string(), "-j".to_string(), cores]);
        }
        cmd
    }
}

/// Compiled-build collaborator.
pub trait Builder {
    fn configure(&self, job: &CmakeJob, reporter: &dyn Reporter) -> Result<()>;
    fn build(&self, job: &CmakeJob, reporter: &dyn Reporter) -> Result<()>;
}

/// [`Builder`] running the `cmake` executable.
#[derive(Debug, Clone)]
pub struct CmakeCli {
    host: Host,
}

impl CmakeCli {
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    fn env(&self) -> Vec<(String, String)> {
        let mut env = vec![("MACOSX_DEPLOYMENT_TARGET".to_string(), "11.0".to_string())];
        match self.host.os {
            Os::MacOs => {
                let flags = std::env::var("CXXFLAGS").map(|f| format!("{f} ")).unwrap_or_default();
                env.push(("CXXFLAGS".to_string(), format!("{flags}-stdlib=libc++")));
            }
            Os::Windows => {
                env.push(("UseMultiToolTask".to_string(), "true".to_string()));
                env.push(("EnforceProcessCountAcrossBuilds".to_string(), "true".to_string()));
            }
            Os::Linux => {}
        }
        env
    }

    fn missing_cmake(&self) -> Error {
        let how = match self.host.os {
            Os::Windows => "Installing this package requires CMake. Get it from http://www.cmake.org/",
            Os::Linux => {
                "Installing this package requires CMake. Get it via your system package manager (e.g. sudo apt-get install cmake), or from http://www.cmake.org/"
            }
            Os::MacOs => {
                "Installing this package requires CMake. Get it via a macOS package manager (Homebrew: \"brew install cmake\", or MacPorts: \"sudo port install cmake\"), or from http://www.cmake.org/"
            }
        };
        Error::MissingProgram(format!("Could not run CMake, perhaps it has not been installed? {how}"))
    }

    fn run(&self, cmdline: &[String], cwd: &Path, what: &str) -> Result<()> {
        let (program, args) = cmdline
            .split_first()
            .ok_or_else(|| Error::Internal("empty command line".to_string()))?;
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .envs(self.env())
            .status()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.missing_cmake()
                } else {
                    Error::Build(format!("{what} failed: {e} (working directory: {})", cwd.display()))
                }
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Build(format!(
                "{what} failed with {status} (working directory: {})",
                cwd.display()
            )))
        }
    }
}

fn quote(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

impl Builder for CmakeCli {
    fn configure(&self, job: &CmakeJob, reporter: &dyn Reporter) -> Result<()> {
        fs::create_dir_all(&job.build_root).map_err(|e| Error::io_at(&job.build_root, &e))?;
        let cmdline = job.configure_command();
        reporter.info(&format!("Running CMake: {cmdline:?}"));

        let script = job
            .build_root
            .join(if self.host.is_windows() { "recmake.bat" } else { "recmake.sh" });
        let text = cmdline.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ");
        fs::write(&script, text).map_err(|e| Error::io_at(&script, &e))?;

        self.run(&cmdline, &job.build_root, "CMake invocation")
    }

    fn build(&self, job: &CmakeJob, reporter: &dyn Reporter) -> Result<()> {
        if job.cores > 1 {
            reporter.info(&format!("Performing a parallel build with {} cores.", job.cores));
        } else {
            reporter.info("Performing a singlethreaded build.");
        }
        let cmdline = job.build_command();
        reporter.info(&format!("Running build: {cmdline:?}"));
        self.run(&cmdline, &job.build_root, "Build")
    }
}

/// The tools a recipe needs besides the item.
pub struct Toolchain<'a> {
    pub vcs: &'a dyn Vcs,
    pub builder: &'a dyn Builder,
    pub reporter: &'a dyn Reporter,
}

fn clone_source(ctx: &Context, item: &Item, tc: &Toolchain<'_>, dest: &Path) -> Result<()> {
    let url = item
        .download_url(&ctx.host)
        .ok_or_else(|| Error::Internal(format!("{} has no source repository", item.name)))?;
    let branch = item
        .def
        .git_branch
        .as_deref()
        .ok_or_else(|| Error::Internal(format!("{} has no git branch", item.name)))?;
    tc.vcs.clone_or_pull(url, dest, branch, tc.reporter)
}

fn expect_binary(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Build(format!("expected build output '{}' was not produced", path.display())))
    }
}

/// Clone LLVM and build clang and lld.
pub fn build_llvm(ctx: &Context, item: &Item, tc: &Toolchain<'_>) -> Result<()> {
    debug!("build_llvm({item})");
    let root = item.installation_path(ctx);
    let src = root.join("src");
    clone_source(ctx, item, tc, &src)?;

    let mut job = CmakeJob::new(ctx, item, src.join("llvm"), root.join(llvm_build_dir(ctx, item)));
    let tests = if ctx.settings.build_tests { "ON" } else { "OFF" };
    let assertions = if ctx.settings.assertions.enabled_for(&job.build_type) { "ON" } else { "OFF" };
    let targets = match ctx.host.arch {
        Arch::X86 | Arch::X86_64 => "WebAssembly;X86",
        Arch::Arm => "WebAssembly;ARM",
        Arch::Arm64 => "WebAssembly;AArch64",
    };
    job.args.extend([
        format!("-DLLVM_TARGETS_TO_BUILD={targets}"),
        "-DLLVM_INCLUDE_EXAMPLES=OFF".to_string(),
        format!("-DLLVM_INCLUDE_TESTS={tests}"),
        format!("-DCLANG_INCLUDE_TESTS={tests}"),
        format!("-DLLVM_ENABLE_ASSERTIONS={assertions}"),
        "-DLLVM_ENABLE_LIBXML2=OFF".to_string(),
        "-DLLVM_ENABLE_TERMINFO=OFF".to_string(),
        "-DLLDB_ENABLE_LIBEDIT=OFF".to_string(),
        "-DLLVM_ENABLE_LIBEDIT=OFF".to_string(),
        "-DLLVM_ENABLE_LIBPFM=OFF".to_string(),
        "-DLLVM_ENABLE_PROJECTS=clang;lld".to_string(),
        "-DLLVM_TEMPORARILY_ALLOW_OLD_TOOLCHAIN=ON".to_string(),
    ]);
    if !ctx.settings.llvm_cmake_args.is_empty() {
        tc.reporter.info(&format!(
            "Passing the following extra arguments to LLVM CMake configuration: {:?}",
            ctx.settings.llvm_cmake_args
        ));
        job.args.extend(ctx.settings.llvm_cmake_args.iter().cloned());
    }

    tc.builder.configure(&job, tc.reporter)?;
    tc.builder.build(&job, tc.reporter)?;
    let clang = root
        .join(llvm_build_bin_dir(ctx, item))
        .join(format!("clang{}", ctx.host.exe_suffix()));
    expect_binary(&clang)
}

/// Copy `<name>` from the build tree into `<install>/bin`.
fn deploy_binary(root: &Path, build_root: &Path, name: &str) -> Result<()> {
    let bin_dir = root.join("bin");
    fs::create_dir_all(&bin_dir).map_err(|e| Error::io_at(&bin_dir, &e))?;
    let mut deployed = None;
    for dir in [build_root.join("Release"), build_root.to_path_buf()] {
        for suffix in [".exe", ""] {
            let src = dir.join(format!("{name}{suffix}"));
            if src.is_file() {
                let dst = bin_dir.join(format!("{name}{suffix}"));
                copy_executable(&src, &dst).map_err(|e| Error::io_at(&dst, &e))?;
                deployed = Some(dst);
            }
        }
    }
    match deployed {
        Some(path) => expect_binary(&path),
        None => Err(Error::Build(format!(
            "expected build output '{name}' was not found in '{}'",
            build_root.display()
        ))),
    }
}

fn build_from_git(ctx: &Context, item: &Item, tc: &Toolchain<'_>, extra: &[&str], binary: &str) -> Result<PathBuf> {
    let root = item.installation_path(ctx);
    let src = root.join("src");
    clone_source(ctx, item, tc, &src)?;
    let build_root = root.join(llvm_build_dir(ctx, item));
    let mut job = CmakeJob::new(ctx, item, src, build_root.clone());
    job.args.extend(extra.iter().map(|s| s.to_string()));
    tc.builder.configure(&job, tc.reporter)?;
    tc.builder.build(&job, tc.reporter)?;
    deploy_binary(&root, &build_root, binary)?;
    Ok(root)
}

/// Clone and build ninja.
pub fn build_ninja(ctx: &Context, item: &Item, tc: &Toolchain<'_>) -> Result<()> {
    debug!("build_ninja({item})");
    build_from_git(ctx, item, tc, &[], "ninja").map(|_| ())
}

/// Clone and build ccache, then write its emcc config and cache directory.
pub fn build_ccache(ctx: &Context, item: &Item, tc: &Toolchain<'_>) -> Result<()> {
    debug!("build_ccache({item})");
    let root = build_from_git(ctx, item, tc, &["-DZSTD_FROM_INTERNET=ON"], "ccache")?;
    let cache_dir = root.join("cache");
    let conf = root.join("emcc_ccache.conf");
    fs::write(
        &conf,
        format!(
            "# Set maximum cache size to 10 GB:\nmax_size = 10G\ncache_dir = {}\n",
            cache_dir.display()
        ),
    )
    .map_err(|e| Error::io_at(&conf, &e))?;
    fs::create_dir_all(&cache_dir).map_err(|e| Error::io_at(&cache_dir, &e))?;
    Ok(())
}

/// Build binaryen out of tree from an already fetched source directory, then
/// copy the scripts it needs at runtime next to the build.
pub fn build_binaryen(ctx: &Context, item: &Item, tc: &Toolchain<'_>) -> Result<()> {
    debug!("build_binaryen_tool({item})");
    let src = item.installation_path(ctx);
    let build_root = binaryen_build_root(ctx, item);
    let mut job = CmakeJob::new(ctx, item, src.clone(), build_root.clone());
    job.args.extend(["-DENABLE_WERROR=0".to_string(), "-DBUILD_TESTS=0".to_string()]);
    if ctx.settings.generator.contains("Visual Studio") && ctx.settings.build_tests {
        job.args.push("-DRUN_STATIC_ANALYZER=1".to_string());
    }
    tc.builder.configure(&job, tc.reporter)?;
    tc.builder.build(&job, tc.reporter)?;

    for rel in ["scripts", "src/js"] {
        let from = src.join(rel);
        let to = build_root.join(rel);
        if from.is_dir() {
            replace_dir(&from, &to).map_err(|e| Error::io_at(&to, &e))?;
        }
    }
    if build_root.exists() {
        Ok(())
    } else {
        Err(Error::Build(format!("binaryen build directory '{}' is missing", build_root.display())))
    }
}

/// Delete binaryen's out-of-tree build directory.
pub fn uninstall_binaryen(ctx: &Context, item: &Item, reporter: &dyn Reporter) {
    let build_root = binaryen_build_root(ctx, item);
    reporter.info(&format!("Deleting path '{}'", build_root.display()));
    remove_tree(&build_root);
}
