// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use std::borrow::Cow;

use strum::{Display, EnumString};

pub const DEFAULT_DEVICE_NAME: &str = "SBMidi";

/// How outgoing channel or data values outside their valid
/// range are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Drop the message without reporting an error.
    #[default]
    SilentDrop,
    /// Drop the message and return an error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Client name, also used as the prefix of the port names.
    pub name: Cow<'static, str>,

    pub validation: ValidationPolicy,
}

impl DeviceConfig {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name of the virtual source that emits outgoing messages.
    #[must_use]
    pub fn output_port_name(&self) -> String {
        format!("{name} Out", name = self.name)
    }

    /// Name of the virtual destination that receives incoming messages.
    #[must_use]
    pub fn input_port_name(&self) -> String {
        format!("{name} In", name = self.name)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_DEVICE_NAME),
            validation: ValidationPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_names() {
        let config = DeviceConfig::default();
        assert_eq!("SBMidi Out", config.output_port_name());
        assert_eq!("SBMidi In", config.input_port_name());
    }

    #[test]
    fn port_names() {
        let config = DeviceConfig::new("Studio");
        assert_eq!("Studio Out", config.output_port_name());
        assert_eq!("Studio In", config.input_port_name());
        assert_eq!(ValidationPolicy::SilentDrop, config.validation);
    }

    #[test]
    fn validation_policy_from_str() {
        assert_eq!(Ok(ValidationPolicy::SilentDrop), "silent-drop".parse());
        assert_eq!(Ok(ValidationPolicy::Reject), "reject".parse());
        assert!("strict".parse::<ValidationPolicy>().is_err());
        assert_eq!("reject", ValidationPolicy::Reject.to_string());
    }
}
