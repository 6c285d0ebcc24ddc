//! Guest capability registry
//!
//! Which optional hooks a guest platform supports is decided once, from the
//! platform alone, instead of probing the guest at run time.

use std::collections::BTreeSet;

use crate::types::Platform;

/// Optional guest-side hooks run before provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GuestHook {
    /// Block until a pending reboot has finished
    WaitForReboot,
}

/// Hook set supported by one guest platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    platform: Platform,
    hooks: BTreeSet<GuestHook>,
}

impl CapabilityRegistry {
    /// Resolve the hooks a platform supports.
    pub fn for_platform(platform: Platform) -> Self {
        let hooks = match platform {
            Platform::Windows => BTreeSet::from([GuestHook::WaitForReboot]),
            Platform::Posix => BTreeSet::new(),
        };
        Self { platform, hooks }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn supports(&self, hook: GuestHook) -> bool {
        self.hooks.contains(&hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_waits_for_reboot() {
        let registry = CapabilityRegistry::for_platform(Platform::Windows);
        assert!(registry.supports(GuestHook::WaitForReboot));
        assert_eq!(registry.platform(), Platform::Windows);
    }

    #[test]
    fn test_posix_has_no_hooks() {
        let registry = CapabilityRegistry::for_platform(Platform::Posix);
        assert!(!registry.supports(GuestHook::WaitForReboot));
    }
}
