//! Static LoRa frequency-plan table and typed runtime configuration.

use crate::error::ConfigError;

/// One named, immutable radio parameter set. Exactly one profile is
/// active on the LoRa driver at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioProfile {
    /// Plan name, e.g. "EU868.a".
    pub plan: &'static str,
    /// Center frequency in Hz.
    pub frequency_hz: u32,
    /// Bandwidth in Hz.
    pub bandwidth_hz: u32,
    /// Spreading factor.
    pub spreading_factor: u8,
    /// Coding rate denominator (4/x).
    pub coding_rate: u8,
    /// Sync word separating this network from LoRaWAN traffic.
    pub sync_word: u8,
    /// Transmit power in dBm.
    pub tx_power_dbm: i8,
}

const SYNC_WORD: u8 = 0x58;
const TX_POWER_DBM: i8 = 10;

/// Plan used when the settings store is absent or carries no plan name.
pub const DEFAULT_PLAN: &str = "AU915.b";

/// The frequency-plan table. Profiles change only with a firmware
/// update; at runtime they are selected by name.
pub const RADIO_PROFILES: [RadioProfile; 6] = [
    RadioProfile {
        plan: "AU915.a",
        frequency_hz: 917_500_000,
        bandwidth_hz: 500_000,
        spreading_factor: 8,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
    RadioProfile {
        plan: "AU915.b",
        frequency_hz: 917_500_000,
        bandwidth_hz: 125_000,
        spreading_factor: 7,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
    RadioProfile {
        plan: "EU868.a",
        frequency_hz: 868_300_000,
        bandwidth_hz: 250_000,
        spreading_factor: 7,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
    RadioProfile {
        plan: "EU868.b",
        frequency_hz: 868_300_000,
        bandwidth_hz: 125_000,
        spreading_factor: 7,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
    RadioProfile {
        plan: "US915.a",
        frequency_hz: 904_600_000,
        bandwidth_hz: 500_000,
        spreading_factor: 8,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
    RadioProfile {
        plan: "US915.b",
        frequency_hz: 904_600_000,
        bandwidth_hz: 125_000,
        spreading_factor: 7,
        coding_rate: 5,
        sync_word: SYNC_WORD,
        tx_power_dbm: TX_POWER_DBM,
    },
];

/// Look up a profile by plan name.
pub fn profile_by_plan(plan: &str) -> Result<&'static RadioProfile, ConfigError> {
    RADIO_PROFILES
        .iter()
        .find(|p| p.plan == plan)
        .ok_or_else(|| ConfigError::UnknownProfile(plan.to_string()))
}

/// A runtime radio configuration action. The closed set makes an
/// unrecognized request unrepresentable; each variant maps to exactly
/// one radio setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigRequest {
    /// Retune the transmit/receive center frequency.
    SetFrequency {
        /// New center frequency in Hz.
        hz: u32,
    },
    /// Change the transmit power.
    SetTxPower {
        /// New transmit power in dBm.
        dbm: i8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_plan() {
        let p = profile_by_plan("EU868.a").unwrap();
        assert_eq!(p.frequency_hz, 868_300_000);
        assert_eq!(p.bandwidth_hz, 250_000);
        assert_eq!(p.sync_word, 0x58);
    }

    #[test]
    fn test_default_plan_exists() {
        assert!(profile_by_plan(DEFAULT_PLAN).is_ok());
    }

    #[test]
    fn test_unknown_plan_is_an_error() {
        assert_eq!(
            profile_by_plan("EU433"),
            Err(ConfigError::UnknownProfile("EU433".to_string()))
        );
    }

    #[test]
    fn test_plan_names_unique() {
        for (i, a) in RADIO_PROFILES.iter().enumerate() {
            for b in &RADIO_PROFILES[i + 1..] {
                assert_ne!(a.plan, b.plan);
            }
        }
    }
}
