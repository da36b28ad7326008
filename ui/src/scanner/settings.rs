use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::engine::{AttachConfig, FacingConstraint};
use super::session::Facing;

/// Tunables of the scanner widget.
#[derive(Clone, PartialEq, Debug)]
pub struct ScannerSettings {
    /// Live frames sampled per second.
    pub frame_rate: u32,
    /// Edge of the centred decode square, in px.
    pub decode_region: u32,
    pub aspect_ratio: f64,
    /// Pause between releasing one camera and opening the other.
    pub settle_delay: Duration,
    /// Stop the live stream as soon as a code is decoded.
    pub auto_stop: bool,
    pub haptic_pulse: Duration,
    pub initial_facing: Facing,
}

impl ScannerSettings {
    pub const FRAME_RATE: u32 = 10;
    pub const DECODE_REGION: u32 = 250;
    pub const ASPECT_RATIO: f64 = 4.0 / 3.0;
    pub const SETTLE_DELAY_MS: u64 = 1000;
    pub const AUTO_STOP: bool = true;
    pub const HAPTIC_PULSE_MS: u64 = 200;

    /// Creates settings from environment variables, with in-code defaults.
    ///
    /// # Environment Variables
    /// - `QR_SCANNER_FPS`: frames sampled per second.
    /// - `QR_SCANNER_REGION`: decode region edge in px.
    /// - `QR_SCANNER_ASPECT_RATIO`: preferred camera aspect ratio.
    /// - `QR_SCANNER_SETTLE_MS`: settle delay for camera switches.
    /// - `QR_SCANNER_AUTO_STOP`: "true"/"1" or "false"/"0".
    /// - `QR_SCANNER_HAPTIC_MS`: vibration pulse length.
    /// - `QR_SCANNER_FACING`: "front"/"user" or "back"/"environment".
    ///
    /// The browser has no environment, so there the defaults always apply.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    /// Values that fail to parse fall back to the default.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(value: Option<String>, default: T) -> T {
            value
                .and_then(|v| v.trim().parse::<T>().ok())
                .unwrap_or(default)
        }

        let frame_rate = parsed(lookup("QR_SCANNER_FPS"), Self::FRAME_RATE);
        let decode_region = parsed(lookup("QR_SCANNER_REGION"), Self::DECODE_REGION);
        let aspect_ratio = parsed(lookup("QR_SCANNER_ASPECT_RATIO"), Self::ASPECT_RATIO);

        Self {
            frame_rate: if frame_rate == 0 { Self::FRAME_RATE } else { frame_rate },
            // an empty region would leave nothing to sample
            decode_region: if decode_region == 0 {
                Self::DECODE_REGION
            } else {
                decode_region
            },
            aspect_ratio: if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
                aspect_ratio
            } else {
                Self::ASPECT_RATIO
            },
            settle_delay: Duration::from_millis(parsed(
                lookup("QR_SCANNER_SETTLE_MS"),
                Self::SETTLE_DELAY_MS,
            )),
            auto_stop: lookup("QR_SCANNER_AUTO_STOP")
                .and_then(|val| parse_flag(&val))
                .unwrap_or(Self::AUTO_STOP),
            haptic_pulse: Duration::from_millis(parsed(
                lookup("QR_SCANNER_HAPTIC_MS"),
                Self::HAPTIC_PULSE_MS,
            )),
            initial_facing: parsed(lookup("QR_SCANNER_FACING"), Facing::default()),
        }
    }

    pub fn attach_config(&self, facing: Facing, constraint: FacingConstraint) -> AttachConfig {
        AttachConfig {
            frame_rate: self.frame_rate,
            decode_region: self.decode_region,
            aspect_ratio: self.aspect_ratio,
            facing,
            constraint,
        }
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    let val = val.trim();
    if val.eq_ignore_ascii_case("true") || val == "1" {
        Some(true)
    } else if val.eq_ignore_ascii_case("false") || val == "0" {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> ScannerSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ScannerSettings::from_vars(move |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let settings = settings_with(&[]);
        assert_eq!(settings.frame_rate, 10);
        assert_eq!(settings.decode_region, 250);
        assert_eq!(settings.settle_delay, Duration::from_millis(1000));
        assert!(settings.auto_stop);
        assert_eq!(settings.haptic_pulse, Duration::from_millis(200));
        assert_eq!(settings.initial_facing, Facing::Back);
        assert!((settings.aspect_ratio - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn variables_override_defaults() {
        let settings = settings_with(&[
            ("QR_SCANNER_FPS", "5"),
            ("QR_SCANNER_REGION", "300"),
            ("QR_SCANNER_SETTLE_MS", "250"),
            ("QR_SCANNER_AUTO_STOP", "FALSE"),
            ("QR_SCANNER_FACING", "user"),
            ("QR_SCANNER_ASPECT_RATIO", "1.0"),
        ]);
        assert_eq!(settings.frame_rate, 5);
        assert_eq!(settings.decode_region, 300);
        assert_eq!(settings.settle_delay, Duration::from_millis(250));
        assert!(!settings.auto_stop);
        assert_eq!(settings.initial_facing, Facing::Front);
        assert_eq!(settings.aspect_ratio, 1.0);
    }

    #[test]
    fn invalid_values_fall_back() {
        let settings = settings_with(&[
            ("QR_SCANNER_FPS", "0"),
            ("QR_SCANNER_REGION", "big"),
            ("QR_SCANNER_AUTO_STOP", "maybe"),
            ("QR_SCANNER_ASPECT_RATIO", "-2"),
            ("QR_SCANNER_FACING", "sideways"),
        ]);
        assert_eq!(settings.frame_rate, ScannerSettings::FRAME_RATE);
        assert_eq!(settings.decode_region, ScannerSettings::DECODE_REGION);
        assert!(settings.auto_stop);
        assert_eq!(settings.aspect_ratio, ScannerSettings::ASPECT_RATIO);
        assert_eq!(settings.initial_facing, Facing::Back);
    }

    #[test]
    fn zero_decode_region_falls_back() {
        let settings = settings_with(&[("QR_SCANNER_REGION", "0")]);
        assert_eq!(settings.decode_region, ScannerSettings::DECODE_REGION);
    }

    #[test]
    fn attach_config_carries_settings() {
        let config = settings_with(&[("QR_SCANNER_FPS", "4")])
            .attach_config(Facing::Back, FacingConstraint::Exact);
        assert_eq!(config.frame_rate, 4);
        assert_eq!(config.frame_interval_ms(), 250);
        assert_eq!(config.constraint, FacingConstraint::Exact);
    }
}
