use serde::{Deserialize, Serialize};

/// Identification reported by the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Hardware version, the first two characters of the version reply.
    pub hardware_version: Option<String>,
    /// Software version, the next two characters of the version reply.
    pub software_version: Option<String>,
    pub serial_number: Option<String>,
}

impl AdapterInfo {
    /// Build from raw version and serial number reply text.
    pub fn from_replies(version: &str, serial_number: &str) -> Self {
        let (hardware_version, software_version) = split_version(version);
        Self {
            hardware_version,
            software_version,
            serial_number: Some(serial_number.to_owned()),
        }
    }
}

/// Split a version reply such as `1013` into hardware (`10`) and software
/// (`13`) parts. Missing parts come back as `None`.
pub fn split_version(reply: &str) -> (Option<String>, Option<String>) {
    let mut chars = reply.chars();
    let mut part = || {
        let text: String = chars.by_ref().take(2).collect();
        (text.chars().count() == 2).then_some(text)
    };
    let hardware = part();
    let software = part();
    (hardware, software)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_four_digit_version() {
        assert_eq!(
            split_version("1013"),
            (Some("10".to_owned()), Some("13".to_owned()))
        );
    }

    #[test]
    fn short_version_leaves_parts_empty() {
        assert_eq!(split_version("10"), (Some("10".to_owned()), None));
        assert_eq!(split_version("1"), (None, None));
        assert_eq!(split_version(""), (None, None));
    }

    #[test]
    fn extra_characters_are_ignored() {
        assert_eq!(
            split_version("101399"),
            (Some("10".to_owned()), Some("13".to_owned()))
        );
    }

    #[test]
    fn from_replies_keeps_serial_verbatim() {
        let info = AdapterInfo::from_replies("2101", "A0B1");
        assert_eq!(info.hardware_version.as_deref(), Some("21"));
        assert_eq!(info.software_version.as_deref(), Some("01"));
        assert_eq!(info.serial_number.as_deref(), Some("A0B1"));
    }
}
