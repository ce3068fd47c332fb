//! CAN bit-rate codes understood by the `S<n>` command.

/// Bit rate used when the caller does not ask for one, in kbit/s.
pub const DEFAULT_BITRATE_KBPS: u32 = 250;

/// Code sent for [`DEFAULT_BITRATE_KBPS`], and for any rate the adapter does not know.
pub const DEFAULT_BITRATE_CODE: u8 = 5;

/// Supported bus speeds in kbit/s, indexed by their adapter code.
const BITRATES_KBPS: [u32; 9] = [10, 20, 50, 100, 125, 250, 500, 800, 1000];

/// Map a bus speed in kbit/s to the adapter's bit-rate code.
///
/// Unrecognized speeds fall back to the 250 kbit/s code rather than failing.
pub fn bitrate_code(kbps: u32) -> u8 {
    BITRATES_KBPS
        .iter()
        .position(|&rate| rate == kbps)
        .map_or(DEFAULT_BITRATE_CODE, |code| code as u8)
}

/// Bus speeds the adapter supports, in kbit/s, ordered by code.
pub fn supported_bitrates() -> &'static [u32] {
    &BITRATES_KBPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_supported_rate() {
        let expected = [
            (10, 0),
            (20, 1),
            (50, 2),
            (100, 3),
            (125, 4),
            (250, 5),
            (500, 6),
            (800, 7),
            (1000, 8),
        ];
        for (kbps, code) in expected {
            assert_eq!(bitrate_code(kbps), code, "{kbps} kbit/s");
        }
    }

    #[test]
    fn unknown_rates_fall_back_to_250k() {
        assert_eq!(bitrate_code(0), 5);
        assert_eq!(bitrate_code(33), 5);
        assert_eq!(bitrate_code(750), 5);
        assert_eq!(bitrate_code(250_000), 5);
        assert_eq!(bitrate_code(u32::MAX), 5);
    }

    #[test]
    fn default_rate_matches_default_code() {
        assert_eq!(bitrate_code(DEFAULT_BITRATE_KBPS), DEFAULT_BITRATE_CODE);
        assert_eq!(supported_bitrates().len(), 9);
    }
}
