//! Row formatting for `emsdk list`.

use super::theme::Theme;

/// Activation marker shown before a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Active in the config and in the current environment: ` * `.
    Active,
    /// Active in the config only: `(*)`.
    Selected,
    Inactive,
}

impl Marker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => " * ",
            Self::Selected => "(*)",
            Self::Inactive => "   ",
        }
    }
}

/// `    * <name padded>\tINSTALLED`
pub fn item_row(theme: &Theme, marker: Marker, name: &str, status: &str) -> String {
    let name = format!("{name:<width$}", width = theme.layout.name_width);
    let status = if status.is_empty() {
        String::new()
    } else {
        format!("\t{status}")
    };
    format!("    {}    {name}{status}", marker.as_str())
}

/// SDK rows carry a single-character marker.
pub fn sdk_row(theme: &Theme, active: bool, name: &str, installed: bool) -> String {
    let name = format!("{name:<width$}", width = theme.layout.name_width);
    let status = if installed { "\tINSTALLED" } else { "" };
    format!("    {}    {name}{status}", if active { '*' } else { ' ' })
}

/// A release version with its install status.
pub fn release_row(version: &str, installed: bool) -> String {
    let status = if installed { "INSTALLED" } else { "" };
    format!("         {version}    {status}")
}

/// One entry of an SDK's `uses` list.
pub fn uses_row(theme: &Theme, dep: &str) -> String {
    format!("          - {:<width$}", dep, width = theme.layout.name_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned() {
        let theme = Theme::default();
        assert_eq!(
            item_row(&theme, Marker::Selected, "node-16.20.0-64bit", "INSTALLED"),
            "    (*)    node-16.20.0-64bit       \tINSTALLED"
        );
        assert_eq!(
            item_row(&theme, Marker::Inactive, "llvm-git-main-64bit", ""),
            "           llvm-git-main-64bit      "
        );
        assert_eq!(uses_row(&theme, "node"), format!("          - node{}", " ".repeat(21)));
    }

    #[test]
    fn release_rows() {
        assert_eq!(release_row("3.1.50", true), "         3.1.50    INSTALLED");
        assert_eq!(release_row("3.1.49", false), "         3.1.49    ");
    }

    #[test]
    fn sdk_rows_use_a_single_star() {
        let theme = Theme::default();
        let row = sdk_row(&theme, true, "sdk-main-64bit", true);
        assert!(row.starts_with("    *    sdk-main-64bit "));
        assert!(row.ends_with("\tINSTALLED"));
        assert!(sdk_row(&theme, false, "sdk-main-64bit", false).starts_with("         sdk"));
    }
}
