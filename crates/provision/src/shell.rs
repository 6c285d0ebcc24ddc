//! Guest-side helper commands
//!
//! The pipeline issues a handful of file-system commands besides the applier
//! run itself. POSIX guests get the usual coreutils forms; Windows guests get
//! PowerShell, where a condition has to `exit` explicitly for its status to
//! reach the communicator.

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::backend::sh_quote;
use crate::types::Platform;

/// Quote `value` as a single shell word for the guest's shell.
pub fn quote(platform: Platform, value: &str) -> String {
    match platform {
        Platform::Posix => sh_quote(value),
        Platform::Windows => format!("'{}'", value.replace('\'', "''")),
    }
}

/// Run a PowerShell script through `powershell.exe`, whatever the login shell is.
///
/// The script travels as base64 UTF-16LE, so no quoting layer of cmd.exe or
/// PowerShell ever sees it.
pub fn powershell_invocation(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    format!(
        "powershell -NoProfile -NonInteractive -EncodedCommand {}",
        STANDARD.encode(bytes)
    )
}

/// Quote `value` for sh only if it contains anything beyond plain path characters.
fn sh_word(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-:+=@%,".contains(c));
    if plain {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(sh_quote(value))
    }
}

fn exit_status(condition: &str) -> String {
    format!("if ({condition}) {{ exit 0 }} else {{ exit 1 }}")
}

/// Condition that holds when `path` is a directory.
pub fn directory_exists(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("test -d {}", sh_word(path)),
        Platform::Windows => exit_status(&format!(
            "Test-Path -LiteralPath {} -PathType Container",
            quote(platform, path)
        )),
    }
}

/// Condition that holds when anything exists at `path`.
pub fn path_exists(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("test -e {}", sh_word(path)),
        Platform::Windows => exit_status(&format!("Test-Path -LiteralPath {}", quote(platform, path))),
    }
}

/// Condition that holds when `path` can be run as a command.
pub fn executable_exists(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("test -x {}", sh_word(path)),
        Platform::Windows => command_exists(platform, path),
    }
}

/// Condition that holds when `name` resolves through the guest's command search path.
pub fn command_exists(platform: Platform, name: &str) -> String {
    match platform {
        Platform::Posix => format!("sh -c {}", sh_quote(&format!("command -v {}", sh_word(name)))),
        Platform::Windows => exit_status(&format!(
            "Get-Command -Name {} -ErrorAction SilentlyContinue",
            quote(platform, name)
        )),
    }
}

/// Create `path` and any missing parents.
pub fn make_directory(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("mkdir -p {}", sh_word(path)),
        Platform::Windows => format!(
            "New-Item -ItemType Directory -Force -Path {} | Out-Null",
            quote(platform, path)
        ),
    }
}

/// Give everyone full access to `path`. Windows guests have nothing to run.
pub fn open_permissions(platform: Platform, path: &str) -> Option<String> {
    match platform {
        Platform::Posix => Some(format!("chmod 0777 {}", sh_word(path))),
        Platform::Windows => None,
    }
}

/// Remove `path` recursively; a missing path is not an error.
pub fn remove_tree(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("rm -rf {}", sh_word(path)),
        Platform::Windows => {
            let path = quote(platform, path);
            format!("if (Test-Path -LiteralPath {path}) {{ Remove-Item -LiteralPath {path} -Recurse -Force }}")
        }
    }
}

/// Print the contents of the file at `path`.
pub fn read_file(platform: Platform, path: &str) -> String {
    match platform {
        Platform::Posix => format!("cat {}", sh_word(path)),
        Platform::Windows => format!("Get-Content -LiteralPath {}", quote(platform, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_per_platform() {
        assert_eq!(quote(Platform::Posix, "it's"), r"'it'\''s'");
        assert_eq!(quote(Platform::Windows, "it's"), "'it''s'");
        assert_eq!(quote(Platform::Windows, "$HOME"), "'$HOME'");
    }

    #[test]
    fn test_powershell_invocation_is_utf16_base64() {
        assert_eq!(
            powershell_invocation("exit 0"),
            "powershell -NoProfile -NonInteractive -EncodedCommand ZQB4AGkAdAAgADAA"
        );

        let script = make_directory(Platform::Windows, "C:/it's here");
        let encoded = powershell_invocation(&script);
        let payload = encoded.rsplit(' ').next().expect("payload");
        let bytes = STANDARD.decode(payload).expect("base64");
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(String::from_utf16(&units).expect("utf-16"), script);
    }

    #[test]
    fn test_posix_forms() {
        let p = Platform::Posix;
        assert_eq!(directory_exists(p, "/tmp/x"), "test -d /tmp/x");
        assert_eq!(path_exists(p, "/tmp/x/a.conf"), "test -e /tmp/x/a.conf");
        assert_eq!(executable_exists(p, "/opt/puppetlabs/bin/puppet"), "test -x /opt/puppetlabs/bin/puppet");
        assert_eq!(command_exists(p, "puppet"), "sh -c 'command -v puppet'");
        assert_eq!(make_directory(p, "/tmp/x"), "mkdir -p /tmp/x");
        assert_eq!(open_permissions(p, "/tmp/x").as_deref(), Some("chmod 0777 /tmp/x"));
        assert_eq!(remove_tree(p, "/tmp/x"), "rm -rf /tmp/x");
        assert_eq!(read_file(p, "/tmp/x"), "cat /tmp/x");
    }

    #[test]
    fn test_posix_paths_with_spaces_are_quoted() {
        let p = Platform::Posix;
        assert_eq!(directory_exists(p, "/tmp/my dir"), "test -d '/tmp/my dir'");
        assert_eq!(make_directory(p, "/tmp/o'brien"), r"mkdir -p '/tmp/o'\''brien'");
        assert_eq!(remove_tree(p, "/tmp/$x"), "rm -rf '/tmp/$x'");
    }

    #[test]
    fn test_windows_forms_are_powershell() {
        let w = Platform::Windows;
        assert_eq!(
            directory_exists(w, "C:/tmp/x"),
            "if (Test-Path -LiteralPath 'C:/tmp/x' -PathType Container) { exit 0 } else { exit 1 }"
        );
        assert_eq!(
            path_exists(w, "C:/e/environment.conf"),
            "if (Test-Path -LiteralPath 'C:/e/environment.conf') { exit 0 } else { exit 1 }"
        );
        assert_eq!(
            command_exists(w, "puppet"),
            "if (Get-Command -Name 'puppet' -ErrorAction SilentlyContinue) { exit 0 } else { exit 1 }"
        );
        assert_eq!(executable_exists(w, "C:/p/puppet"), command_exists(w, "C:/p/puppet"));
        assert_eq!(
            make_directory(w, "C:/tmp/x"),
            "New-Item -ItemType Directory -Force -Path 'C:/tmp/x' | Out-Null"
        );
        assert_eq!(open_permissions(w, "C:/tmp/x"), None);
        assert_eq!(
            remove_tree(w, "C:/tmp/x"),
            "if (Test-Path -LiteralPath 'C:/tmp/x') { Remove-Item -LiteralPath 'C:/tmp/x' -Recurse -Force }"
        );
        assert_eq!(read_file(w, "C:/tmp/x"), "Get-Content -LiteralPath 'C:/tmp/x'");
    }
}
