//! A tool or SDK as stored in the registry.
//!
//! [`Item`] wraps the raw manifest record with its registry key and the
//! tool/SDK flag, and answers every question that only needs the item itself
//! plus the [`Context`]: where it installs, which URL applies to this host,
//! and what it contributes to the activated environment.

use crate::cmake;
use crate::context::Context;
use crate::paths::{STAMP_FILE, path_points_to_directory, to_unix_path};
use emsdk_schema::{Host, ItemDef, ItemName};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: ItemName,
    pub is_sdk: bool,
    pub def: ItemDef,
}

impl Item {
    pub fn new(def: ItemDef, is_sdk: bool) -> Self {
        Self {
            name: def.name(),
            is_sdk,
            def,
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn version(&self) -> &str {
        &self.def.version
    }

    /// Whether the item tracks a git branch and is refreshed on every
    /// install.
    pub fn is_git_tracked(&self) -> bool {
        self.def.git_branch.is_some()
    }

    /// Substitute the `%...%` variables understood in manifest strings.
    pub fn expand_vars(&self, ctx: &Context, s: &str) -> String {
        self.expand(ctx, s, true)
    }

    fn expand(&self, ctx: &Context, s: &str, allow_install_dir: bool) -> String {
        let windows = ctx.host.is_windows();
        let mut out = s.to_string();
        if windows && out.contains("%MSBuildPlatformsDir%") {
            out = out.replace("%MSBuildPlatformsDir%", &cmake::msbuild_platforms_dir());
        }
        if out.contains("%cmake_build_type_on_win%") {
            let value = if windows {
                format!("{}/", self.build_type(ctx))
            } else {
                String::new()
            };
            out = out.replace("%cmake_build_type_on_win%", &value);
        }
        if allow_install_dir && out.contains("%installation_dir%") {
            let dir = to_unix_path(&self.installation_dir(ctx).to_string_lossy());
            out = out.replace("%installation_dir%", &dir);
        }
        if out.contains("%generator_prefix%") {
            out = out.replace(
                "%generator_prefix%",
                cmake::generator_prefix(&ctx.settings.generator),
            );
        }
        out = out.replace("%.exe%", ctx.host.exe_suffix());
        if out.contains("%llvm_build_bin_dir%") {
            let dir = to_unix_path(&cmake::llvm_build_bin_dir(ctx, self).to_string_lossy());
            out = out.replace("%llvm_build_bin_dir%", &dir);
        }
        out
    }

    /// CMake build type after applying the command-line override.
    pub fn build_type(&self, ctx: &Context) -> String {
        ctx.settings
            .decide_build_type(self.def.cmake_build_type.as_deref())
    }

    /// Target path of the install; usually a directory, sometimes a file.
    ///
    /// Defaults to `<id>/<version>[_<bitness>bit]` under the root.
    pub fn installation_path(&self, ctx: &Context) -> PathBuf {
        if let Some(template) = &self.def.install_path {
            return ctx.layout.sdk_path(self.expand(ctx, template, false));
        }
        let mut leaf = self.def.version.clone();
        if let Some(bits) = self.def.bitness {
            if self.def.append_bitness.unwrap_or(true) {
                leaf.push_str(&format!("_{bits}bit"));
            }
        }
        ctx.layout.sdk_path(PathBuf::from(&self.def.id).join(leaf))
    }

    /// Directory the install lands in.
    pub fn installation_dir(&self, ctx: &Context) -> PathBuf {
        let path = self.installation_path(ctx);
        if path_points_to_directory(&path.to_string_lossy()) {
            path
        } else {
            path.parent().map(PathBuf::from).unwrap_or(path)
        }
    }

    /// Path of the `.emsdk_version` stamp.
    pub fn version_file_path(&self, ctx: &Context) -> PathBuf {
        self.installation_path(ctx).join(STAMP_FILE)
    }

    /// URL to fetch on this host: the OS-specific one if declared, else the
    /// generic one.
    pub fn download_url(&self, host: &Host) -> Option<&str> {
        let d = &self.def;
        let os_specific = match host.os {
            emsdk_schema::Os::Windows => d.windows_url.as_ref(),
            emsdk_schema::Os::MacOs => d.macos_url.as_ref(),
            emsdk_schema::Os::Linux => d.linux_url.as_ref(),
        };
        os_specific
            .or(if host.os.is_unix() { d.unix_url.as_ref() } else { None })
            .or(d.url.as_ref())
            .map(String::as_str)
    }

    /// Whether the definition applies to `host` at all.
    pub fn compatible_with(&self, host: &Host) -> bool {
        let d = &self.def;
        let arch_ok = host.matches_arch(d.arch.as_deref());
        if let Some(os) = &d.os {
            return os == "all" || (arch_ok && host.matches_os(os));
        }
        if d.macos_url.is_none() && d.windows_url.is_none() && d.unix_url.is_none() && d.linux_url.is_none() {
            return true;
        }
        let os_url = match host.os {
            emsdk_schema::Os::MacOs => d.macos_url.is_some(),
            emsdk_schema::Os::Linux => d.linux_url.is_some(),
            emsdk_schema::Os::Windows => d.windows_url.is_some(),
        };
        (os_url && arch_ok) || (host.os.is_unix() && d.unix_url.is_some()) || d.url.is_some()
    }

    /// `Err(reason)` when this host cannot run the item.
    pub fn can_be_installed(&self, host: &Host) -> Result<(), &'static str> {
        if self.def.bitness == Some(64) && !host.is_64bit() {
            return Err("this tool is only provided for 64-bit OSes");
        }
        Ok(())
    }

    /// Entries for `.emscripten`, in declaration order, paths with forward
    /// slashes and surrounding single quotes removed.
    pub fn activated_config(&self, ctx: &Context) -> Vec<(String, String)> {
        let Some(raw) = &self.def.activated_cfg else {
            return Vec::new();
        };
        to_unix_path(&self.expand_vars(ctx, raw))
            .split(';')
            .filter_map(|entry| {
                let (key, value) = entry.split_once('=')?;
                Some((key.trim().to_string(), value.trim().trim_matches('\'').to_string()))
            })
            .collect()
    }

    /// `KEY=value` pairs this item exports, expanded.
    pub fn activated_environment(&self, ctx: &Context) -> Vec<(String, String)> {
        let Some(raw) = &self.def.activated_env else {
            return Vec::new();
        };
        self.expand_vars(ctx, raw)
            .split(';')
            .filter(|e| !e.is_empty())
            .map(parse_key_value)
            .collect()
    }

    /// Directories this item adds to `PATH`, expanded and in host form.
    pub fn activated_paths(&self, ctx: &Context) -> Vec<String> {
        let Some(raw) = &self.def.activated_path else {
            return Vec::new();
        };
        self.expand_vars(ctx, raw)
            .split(';')
            .filter(|p| !p.is_empty())
            .map(|p| ctx.native(p))
            .collect()
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Split `KEY=value` at the first `=`, trimming both sides.
pub fn parse_key_value(line: &str) -> (String, String) {
    match line.split_once('=') {
        Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
        None => (line.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Layout;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Os};

    fn ctx(os: Os, arch: Arch) -> Context {
        Context::new(Layout::new("/e"), Host::new(os, arch), Settings::default())
    }

    fn item(json: &str) -> Item {
        Item::new(serde_json::from_str(json).unwrap(), false)
    }

    #[test]
    fn default_install_path() {
        let ctx = ctx(Os::Linux, Arch::X86_64);
        let node = item(r#"{"id":"node","version":"18.20.3","bitness":64}"#);
        assert_eq!(node.installation_path(&ctx), PathBuf::from("/e/node/18.20.3_64bit"));

        let plain = item(r#"{"id":"node","version":"18.20.3","bitness":64,"append_bitness":false}"#);
        assert_eq!(plain.installation_path(&ctx), PathBuf::from("/e/node/18.20.3"));
    }

    #[test]
    fn expands_installation_dir() {
        let ctx = ctx(Os::Linux, Arch::X86_64);
        let node = item(
            r#"{"id":"node","version":"18","install_path":"node/18","activated_path":"%installation_dir%/bin",
                "activated_env":"EMSDK_NODE=%installation_dir%/bin/node%.exe%"}"#,
        );
        assert_eq!(node.activated_paths(&ctx), vec!["/e/node/18/bin"]);
        assert_eq!(
            node.activated_environment(&ctx),
            vec![("EMSDK_NODE".to_string(), "/e/node/18/bin/node".to_string())]
        );
    }

    #[test]
    fn exe_suffix_on_windows() {
        let ctx = ctx(Os::Windows, Arch::X86_64);
        let node = item(r#"{"id":"node","version":"18"}"#);
        assert_eq!(node.expand_vars(&ctx, "node%.exe%"), "node.exe");
    }

    #[test]
    fn config_entries_are_unquoted() {
        let ctx = ctx(Os::Linux, Arch::X86_64);
        let up = item(
            r#"{"id":"releases","version":"abc","install_path":"upstream",
                "activated_cfg":"LLVM_ROOT='%installation_dir%/bin';BINARYEN_ROOT='%installation_dir%'"}"#,
        );
        assert_eq!(
            up.activated_config(&ctx),
            vec![
                ("LLVM_ROOT".to_string(), "/e/upstream/bin".to_string()),
                ("BINARYEN_ROOT".to_string(), "/e/upstream".to_string()),
            ]
        );
    }

    #[test]
    fn url_selection() {
        let t = item(r#"{"id":"x","version":"1","linux_url":"l.tar.gz","unix_url":"u.tar.gz","url":"g.zip"}"#);
        assert_eq!(t.download_url(&Host::new(Os::Linux, Arch::X86_64)), Some("l.tar.gz"));
        assert_eq!(t.download_url(&Host::new(Os::MacOs, Arch::Arm64)), Some("u.tar.gz"));
        assert_eq!(t.download_url(&Host::new(Os::Windows, Arch::X86_64)), Some("g.zip"));
    }

    #[test]
    fn compatibility() {
        let linux = Host::new(Os::Linux, Arch::X86_64);
        let mac = Host::new(Os::MacOs, Arch::Arm64);
        let win_only = item(r#"{"id":"git","version":"1.9.4","os":"win"}"#);
        assert!(!win_only.compatible_with(&linux));

        let mac_url = item(r#"{"id":"n","version":"1","macos_url":"m.tar.gz","arch":"arm64"}"#);
        assert!(mac_url.compatible_with(&mac));
        assert!(!mac_url.compatible_with(&linux));

        let no_urls = item(r#"{"id":"n","version":"1"}"#);
        assert!(no_urls.compatible_with(&linux));
    }

    #[test]
    fn sixty_four_bit_only() {
        let t = item(r#"{"id":"n","version":"1","bitness":64}"#);
        assert!(t.can_be_installed(&Host::new(Os::Linux, Arch::X86)).is_err());
        assert!(t.can_be_installed(&Host::new(Os::Linux, Arch::X86_64)).is_ok());
    }

    #[test]
    fn key_value() {
        assert_eq!(parse_key_value(" A = b=c "), ("A".into(), "b=c".into()));
        assert_eq!(parse_key_value("LONE"), ("LONE".into(), String::new()));
    }
}
