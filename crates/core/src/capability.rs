//! Capability gating.
//!
//! The gate is a pure predicate over device and engine flags, re-evaluated
//! on every call and never cached: engine capability flags are queried
//! fresh from the collaborator each time, so a mid-process engine swap in
//! tests behaves the same as on device.

use crate::engine::EngineCapabilities;
use crate::{MIN_DEVICE_YEAR_CLASS, SUPPORTED_PLATFORM};

/// Static facts about the device the process runs on, supplied by the
/// embedding application at session construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// False on simulators.
    pub is_physical_device: bool,
    /// OS family identifier, e.g. `"ios"` or `"android"`.
    pub platform_family: String,
    /// Release-year class of the device's chip.
    pub device_year_class: u16,
}

impl DeviceProfile {
    /// A profile that passes every device-side check. Engine flags still
    /// decide overall availability.
    pub fn physical(platform_family: &str, device_year_class: u16) -> Self {
        Self {
            is_physical_device: true,
            platform_family: platform_family.to_string(),
            device_year_class,
        }
    }
}

/// The first failing predicate, in fixed priority order:
/// simulator > wrong platform > chip too old > engine-unsupported > unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailabilityReason {
    /// Running in a simulator.
    NotAPhysicalDevice,
    /// Device runs an OS family the engine does not ship on.
    UnsupportedPlatform { found: String },
    /// Chip predates the engine's minimum year class.
    ChipTooOld { year_class: u16 },
    /// The engine build reports no tracking support, or predates the
    /// start entrypoint.
    EngineUnsupported,
    /// None of the known predicates failed.
    Unknown,
}

impl std::fmt::Display for UnavailabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailabilityReason::NotAPhysicalDevice => {
                write!(f, "cannot run AR in a simulator")
            }
            UnavailabilityReason::UnsupportedPlatform { found } => {
                write!(
                    f,
                    "AR requires an {SUPPORTED_PLATFORM} device, found {found}"
                )
            }
            UnavailabilityReason::ChipTooOld { year_class } => {
                write!(
                    f,
                    "AR requires a device with a {MIN_DEVICE_YEAR_CLASS}-class chip or newer, found year class {year_class}"
                )
            }
            UnavailabilityReason::EngineUnsupported => {
                write!(f, "the engine build does not support tracking")
            }
            UnavailabilityReason::Unknown => write!(f, "unknown reason"),
        }
    }
}

/// Evaluates the gate: `Ok(())` iff the device is physical, the platform
/// matches, the chip is recent enough, and the engine reports both
/// tracking support and a start entrypoint.
pub fn availability(
    profile: &DeviceProfile,
    caps: &EngineCapabilities,
) -> Result<(), UnavailabilityReason> {
    if !profile.is_physical_device {
        return Err(UnavailabilityReason::NotAPhysicalDevice);
    }
    if profile.platform_family != SUPPORTED_PLATFORM {
        return Err(UnavailabilityReason::UnsupportedPlatform {
            found: profile.platform_family.clone(),
        });
    }
    if profile.device_year_class < MIN_DEVICE_YEAR_CLASS {
        return Err(UnavailabilityReason::ChipTooOld {
            year_class: profile.device_year_class,
        });
    }
    if !caps.tracking_supported || !caps.has_start_entrypoint {
        return Err(UnavailabilityReason::EngineUnsupported);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capable_engine() -> EngineCapabilities {
        EngineCapabilities {
            tracking_supported: true,
            has_start_entrypoint: true,
            version: "2.0".into(),
            world_tracking: true,
            orientation_tracking: true,
            face_tracking: false,
        }
    }

    fn capable_profile() -> DeviceProfile {
        DeviceProfile::physical("ios", 2018)
    }

    #[test]
    fn available_when_every_predicate_passes() {
        assert_eq!(availability(&capable_profile(), &capable_engine()), Ok(()));
    }

    #[test]
    fn simulator_fails_first() {
        // Every predicate failing at once still reports the simulator.
        let profile = DeviceProfile {
            is_physical_device: false,
            platform_family: "android".into(),
            device_year_class: 2012,
        };
        let caps = EngineCapabilities {
            tracking_supported: false,
            has_start_entrypoint: false,
            ..capable_engine()
        };
        assert_eq!(
            availability(&profile, &caps),
            Err(UnavailabilityReason::NotAPhysicalDevice)
        );
    }

    #[test]
    fn wrong_platform_outranks_chip_age() {
        let profile = DeviceProfile::physical("android", 2012);
        assert_eq!(
            availability(&profile, &capable_engine()),
            Err(UnavailabilityReason::UnsupportedPlatform {
                found: "android".into()
            })
        );
    }

    #[test]
    fn chip_older_than_minimum_year_class_fails() {
        let profile = DeviceProfile::physical("ios", 2014);
        assert_eq!(
            availability(&profile, &capable_engine()),
            Err(UnavailabilityReason::ChipTooOld { year_class: 2014 })
        );
        // Boundary: exactly the minimum year class passes.
        let profile = DeviceProfile::physical("ios", 2015);
        assert_eq!(availability(&profile, &capable_engine()), Ok(()));
    }

    #[test]
    fn engine_without_tracking_or_start_entrypoint_fails() {
        let caps = EngineCapabilities {
            tracking_supported: false,
            ..capable_engine()
        };
        assert_eq!(
            availability(&capable_profile(), &caps),
            Err(UnavailabilityReason::EngineUnsupported)
        );

        let caps = EngineCapabilities {
            has_start_entrypoint: false,
            ..capable_engine()
        };
        assert_eq!(
            availability(&capable_profile(), &caps),
            Err(UnavailabilityReason::EngineUnsupported)
        );
    }

    #[test]
    fn truth_table_over_profile_combinations() {
        for physical in [false, true] {
            for platform in ["ios", "android"] {
                for year in [2014u16, 2016] {
                    for supported in [false, true] {
                        let profile = DeviceProfile {
                            is_physical_device: physical,
                            platform_family: platform.into(),
                            device_year_class: year,
                        };
                        let caps = EngineCapabilities {
                            tracking_supported: supported,
                            ..capable_engine()
                        };
                        let expect_ok =
                            physical && platform == "ios" && year >= 2015 && supported;
                        assert_eq!(
                            availability(&profile, &caps).is_ok(),
                            expect_ok,
                            "physical={physical} platform={platform} year={year} supported={supported}"
                        );
                    }
                }
            }
        }
    }
}
