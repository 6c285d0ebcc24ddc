//! Applier binary discovery
//!
//! First ask the guest's command search path. If that fails, assume the
//! all-in-one package layout and probe the binary under its install prefix.

use crate::backend::Communicator;
use crate::error::{Error, Result};
use crate::shell;
use crate::types::{BinarySource, Platform, ResolvedBinary, join_guest};

/// Name of the applier binary
pub const PUPPET_BINARY: &str = "puppet";

/// Install prefix of the Puppet all-in-one packages
pub const FALLBACK_PREFIX: &str = "/opt/puppetlabs/bin";

/// Condition that succeeds when `binary` is on the guest's search path.
pub fn search_path_probe(binary: &str, configured_prefix: Option<&str>, platform: Platform) -> String {
    match (platform, configured_prefix) {
        (Platform::Windows, Some(prefix)) => shell::command_exists(platform, &join_guest(prefix, binary)),
        _ => shell::command_exists(platform, binary),
    }
}

/// Locate `binary` on the guest.
///
/// The returned [`ResolvedBinary`] carries the prefix the command builder
/// must use: the configured one when the search path probe succeeds, the
/// fallback prefix otherwise. When both probes fail the error names the
/// fallback prefix that was tried.
pub fn locate(
    comm: &dyn Communicator,
    binary: &str,
    configured_prefix: Option<&str>,
    platform: Platform,
) -> Result<ResolvedBinary> {
    let probe = search_path_probe(binary, configured_prefix, platform);
    if comm.test(&probe, false)? {
        log::debug!("Found {} on the guest search path", binary);
        return Ok(ResolvedBinary {
            name: binary.to_string(),
            prefix: configured_prefix.map(str::to_string),
            source: BinarySource::SearchPath,
        });
    }

    let candidate = join_guest(FALLBACK_PREFIX, binary);
    log::debug!(
        "{} not on the guest search path, trying {}",
        binary,
        candidate
    );
    if comm.test(&shell::executable_exists(platform, &candidate), true)? {
        return Ok(ResolvedBinary {
            name: binary.to_string(),
            prefix: Some(FALLBACK_PREFIX.to_string()),
            source: BinarySource::Fallback,
        });
    }

    Err(Error::BinaryNotDetected {
        binary: binary.to_string(),
        prefix: FALLBACK_PREFIX.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MockCommunicator};

    #[test]
    fn test_probe_commands() {
        assert_eq!(
            search_path_probe("puppet", None, Platform::Posix),
            "sh -c 'command -v puppet'"
        );
        assert_eq!(
            search_path_probe("puppet", Some("/usr/local/bin"), Platform::Posix),
            "sh -c 'command -v puppet'"
        );
        assert_eq!(
            search_path_probe("puppet", None, Platform::Windows),
            "if (Get-Command -Name 'puppet' -ErrorAction SilentlyContinue) { exit 0 } else { exit 1 }"
        );
        assert_eq!(
            search_path_probe("puppet", Some("C:/puppet/bin"), Platform::Windows),
            "if (Get-Command -Name 'C:/puppet/bin/puppet' -ErrorAction SilentlyContinue) { exit 0 } else { exit 1 }"
        );
    }

    #[test]
    fn test_windows_fallback_uses_get_command() {
        let mock = MockCommunicator::new();
        mock.set_test(search_path_probe("puppet", None, Platform::Windows), false);

        let binary = locate(&mock, "puppet", None, Platform::Windows).unwrap();
        assert_eq!(binary.source, BinarySource::Fallback);
        assert_eq!(
            mock.tested()[1],
            "if (Get-Command -Name '/opt/puppetlabs/bin/puppet' -ErrorAction SilentlyContinue) { exit 0 } else { exit 1 }"
        );
    }

    #[test]
    fn test_found_on_search_path() {
        let mock = MockCommunicator::new();
        let binary = locate(&mock, "puppet", None, Platform::Posix).unwrap();

        assert_eq!(binary.source, BinarySource::SearchPath);
        assert_eq!(binary.prefix, None);
        assert_eq!(binary.invocation(), "puppet");
        assert_eq!(mock.tested().len(), 1);
    }

    #[test]
    fn test_configured_prefix_is_kept() {
        let mock = MockCommunicator::new();
        let binary = locate(&mock, "puppet", Some("/usr/local/bin"), Platform::Posix).unwrap();
        assert_eq!(binary.invocation(), "/usr/local/bin/puppet");
    }

    #[test]
    fn test_falls_back_to_install_prefix() {
        let mock = MockCommunicator::new();
        mock.set_test("sh -c 'command -v puppet'", false);

        let binary = locate(&mock, "puppet", None, Platform::Posix).unwrap();
        assert_eq!(binary.source, BinarySource::Fallback);
        assert_eq!(binary.prefix.as_deref(), Some(FALLBACK_PREFIX));
        assert_eq!(binary.invocation(), "/opt/puppetlabs/bin/puppet");

        assert_eq!(
            mock.calls()[1],
            Call::Test {
                condition: "test -x /opt/puppetlabs/bin/puppet".to_string(),
                elevated: true,
            }
        );
    }

    #[test]
    fn test_not_detected_names_fallback_prefix() {
        let mock = MockCommunicator::new();
        mock.set_test("sh -c 'command -v puppet'", false);
        mock.set_test("test -x /opt/puppetlabs/bin/puppet", false);

        let err = locate(&mock, "puppet", None, Platform::Posix).unwrap_err();
        match err {
            Error::BinaryNotDetected { binary, prefix } => {
                assert_eq!(binary, "puppet");
                assert_eq!(prefix, FALLBACK_PREFIX);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.tested().len(), 2);
    }
}
