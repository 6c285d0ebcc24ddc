//! Shared folder verification

use crate::backend::Communicator;
use crate::error::{Error, Result};
use crate::shell;
use crate::types::Platform;

/// Check that every guest path exists as a directory, in order.
///
/// Stops at the first missing path; later paths are not tested.
pub fn verify(comm: &dyn Communicator, guest_paths: &[String], platform: Platform) -> Result<()> {
    for path in guest_paths {
        log::debug!("Checking for shared folder: {}", path);
        if !comm.test(&shell::directory_exists(platform, path), true)? {
            return Err(Error::MissingSharedFolder { path: path.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MockCommunicator};

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_all_present() {
        let mock = MockCommunicator::new();
        verify(&mock, &paths(&["/a", "/b"]), Platform::Posix).expect("all folders exist");
        assert_eq!(mock.tested(), vec!["test -d /a", "test -d /b"]);
    }

    #[test]
    fn test_fails_fast_on_first_missing() {
        let mock = MockCommunicator::new();
        mock.set_test("test -d /b", false);

        let err = verify(&mock, &paths(&["/a", "/b", "/c"]), Platform::Posix).unwrap_err();
        match err {
            Error::MissingSharedFolder { path } => assert_eq!(path, "/b"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.tested(), vec!["test -d /a", "test -d /b"]);
    }

    #[test]
    fn test_checks_are_elevated() {
        let mock = MockCommunicator::new();
        verify(&mock, &paths(&["/a"]), Platform::Posix).unwrap();
        assert_eq!(
            mock.calls(),
            vec![Call::Test {
                condition: "test -d /a".to_string(),
                elevated: true,
            }]
        );
    }

    #[test]
    fn test_empty_list_touches_nothing() {
        let mock = MockCommunicator::new();
        verify(&mock, &[], Platform::Posix).unwrap();
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_windows_checks_use_test_path() {
        let mock = MockCommunicator::new();
        let missing = "if (Test-Path -LiteralPath 'C:/b' -PathType Container) { exit 0 } else { exit 1 }";
        mock.set_test(missing, false);

        let err = verify(&mock, &paths(&["C:/a", "C:/b"]), Platform::Windows).unwrap_err();
        assert!(matches!(err, Error::MissingSharedFolder { ref path } if path == "C:/b"));
        assert_eq!(mock.tested().last().map(String::as_str), Some(missing));
        assert!(!mock.tested().iter().any(|c| c.starts_with("test ")));
    }
}
