use serde::{Deserialize, Serialize};

use crate::day_night::Keyframe;
use crate::error::LightingError;
use crate::rig::DeviceClass;

/// Lighting configuration. Maps to the `[lighting]` table of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Forced device class. `None` picks one from the initial viewport.
    pub device_class: Option<DeviceClass>,
    /// Sun shadow map resolution on desktop-class devices.
    pub desktop_shadow_map_size: u32,
    /// Sun shadow map resolution on mobile-class devices.
    pub mobile_shadow_map_size: u32,
    /// How ambient and hemisphere fill follow the sun.
    pub secondary: SecondaryCoefficients,
    /// Replacement sun keyframe table. Validated once at startup.
    pub keyframes: Option<Vec<Keyframe>>,
    /// Environment bake parameters.
    pub environment: EnvironmentSettings,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            device_class: None,
            desktop_shadow_map_size: 2048,
            mobile_shadow_map_size: 1024,
            secondary: SecondaryCoefficients::default(),
            keyframes: None,
            environment: EnvironmentSettings::default(),
        }
    }
}

impl LightingConfig {
    /// Shadow map resolution for the given device class
    pub fn shadow_map_size(&self, device: DeviceClass) -> u32 {
        match device {
            DeviceClass::Desktop => self.desktop_shadow_map_size,
            DeviceClass::Mobile => self.mobile_shadow_map_size,
        }
    }
}

/// Linear coefficients deriving fill-light intensities from the sun.
///
/// `ambient = ambient_base + sun * ambient_per_sun`, and likewise for the
/// hemisphere light. Every term must be finite and non-negative, checked by
/// [`SecondaryCoefficients::validate`] at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryCoefficients {
    pub ambient_base: f32,
    pub ambient_per_sun: f32,
    pub hemisphere_base: f32,
    pub hemisphere_per_sun: f32,
}

impl Default for SecondaryCoefficients {
    fn default() -> Self {
        Self {
            ambient_base: 0.15,
            ambient_per_sun: 0.2,
            hemisphere_base: 0.2,
            hemisphere_per_sun: 0.25,
        }
    }
}

impl SecondaryCoefficients {
    /// Reject non-finite values and negative terms
    pub fn validate(&self) -> Result<(), LightingError> {
        let terms = [
            ("ambient_base", self.ambient_base),
            ("ambient_per_sun", self.ambient_per_sun),
            ("hemisphere_base", self.hemisphere_base),
            ("hemisphere_per_sun", self.hemisphere_per_sun),
        ];
        for (name, value) in terms {
            if !value.is_finite() {
                return Err(LightingError::InvalidCoefficients(format!(
                    "{} is not finite",
                    name
                )));
            }
            if value < 0.0 {
                return Err(LightingError::InvalidCoefficients(format!(
                    "{} is negative ({})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Resolution of the baked equirectangular environment map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub width: u32,
    pub height: u32,
    /// Upper bound on the number of mip levels, base level included.
    pub max_mip_levels: u32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            max_mip_levels: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_validate() {
        assert!(SecondaryCoefficients::default().validate().is_ok());

        let negative_slope = SecondaryCoefficients {
            ambient_per_sun: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            negative_slope.validate(),
            Err(LightingError::InvalidCoefficients(_))
        ));

        let negative_base = SecondaryCoefficients {
            hemisphere_base: -0.1,
            ..Default::default()
        };
        assert!(negative_base.validate().is_err());

        let not_finite = SecondaryCoefficients {
            hemisphere_per_sun: f32::NAN,
            ..Default::default()
        };
        assert!(not_finite.validate().is_err());

        let infinite = SecondaryCoefficients {
            ambient_base: f32::INFINITY,
            ..Default::default()
        };
        assert!(infinite.validate().is_err());
    }

    #[test]
    fn test_default_shadow_sizes() {
        let config = LightingConfig::default();
        assert_eq!(config.shadow_map_size(DeviceClass::Desktop), 2048);
        assert_eq!(config.shadow_map_size(DeviceClass::Mobile), 1024);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: LightingConfig = toml::from_str(
            r#"
            mobile_shadow_map_size = 512

            [secondary]
            ambient_base = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(config.mobile_shadow_map_size, 512);
        assert_eq!(config.desktop_shadow_map_size, 2048);
        assert_eq!(config.secondary.ambient_base, 0.1);
        assert_eq!(config.secondary.hemisphere_per_sun, 0.25);
        assert!(config.keyframes.is_none());
    }
}
