//! Colormap settings for an image view.
//!
//! A `ColorState` holds the colormap name, its orientation, the gamma and
//! scale parameters, the per-channel color mix, the data transform, and the
//! colors used for NaN pixels and the image border. Every setter validates
//! its input, writes only values that actually change, and flushes the state
//! so subscribers see one notification per command.

use std::any::Any;

use carta_registry::{
    param, parse_params, CartaObject, ClassName, ObjectCore, ObjectId, ObjectManager,
    RegistryError, RegistryResult,
};
use carta_state::lookup;
use carta_types::SnapshotKind;
use serde_json::Value;

const COLOR_MAP_NAME: &str = "colorMapName";
const REVERSE: &str = "reverse";
const INVERT: &str = "invert";
const NAN_DEFAULT: &str = "nanDefault";
const BORDER_DEFAULT: &str = "borderDefault";
const GAMMA: &str = "gamma";
const SCALE_1: &str = "scale1";
const SCALE_2: &str = "scale2";
const COLOR_MIX: &str = "colorMix";
const TRANSFORM_IMAGE: &str = "imageTransform";
const TRANSFORM_DATA: &str = "dataTransform";
const NAN_COLOR: &str = "nanColor";
const BORDER_COLOR: &str = "borderColor";

const RED: &str = "red";
const GREEN: &str = "green";
const BLUE: &str = "blue";
const ALPHA: &str = "alpha";

/// Mix changes smaller than this are ignored.
const MIX_TOLERANCE: f64 = 0.001;

/// Gamma and scales are stored rounded to this many significant digits.
const SIGNIFICANT_DIGITS: i32 = 6;

/// Gamma and scale changes no larger than this are ignored.
const ERROR_MARGIN: f64 = 0.000_001;

/// Settings copied by [`ColorState::replicate`].
const REPLICATED: &[&str] = &[
    COLOR_MAP_NAME,
    INVERT,
    REVERSE,
    NAN_DEFAULT,
    BORDER_DEFAULT,
    COLOR_MIX,
    NAN_COLOR,
    GAMMA,
    SCALE_1,
    SCALE_2,
    TRANSFORM_DATA,
    BORDER_COLOR,
];

/// Colormaps a `ColorState` may select.
pub const COLOR_MAPS: &[&str] = &[
    "Gray", "Heat", "Rainbow", "Jet", "Hot", "Cool", "Spring", "Summer", "Autumn", "Winter",
    "Bone", "Copper", "Pink", "Cubehelix", "Viridis", "Magma", "Inferno", "Plasma",
];

/// Transforms applied to pixel values before color lookup.
pub const DATA_TRANSFORMS: &[&str] = &["None", "Square Root", "Log", "Power"];

const DEFAULT_IMAGE_TRANSFORM: &str = "Gamma";

/// Colormap settings object.
#[derive(Debug)]
pub struct ColorState {
    core: ObjectCore,
}

impl ColorState {
    pub const CLASS_NAME: &'static str = "ColorState";

    pub const SET_COLOR_MAP: &'static str = "setColorMap";
    pub const REVERSE_COLOR_MAP: &'static str = "reverseColormap";
    pub const INVERT_COLOR_MAP: &'static str = "invertColormap";
    pub const SET_COLOR_MIX: &'static str = "setColorMix";
    pub const SET_GAMMA: &'static str = "setGamma";
    pub const SET_SCALES: &'static str = "setScales";
    pub const SET_DATA_TRANSFORM: &'static str = "setDataTransform";
    pub const SET_NAN_COLOR: &'static str = "setNanColor";
    pub const SET_NAN_DEFAULT: &'static str = "setNanDefault";
    pub const SET_BORDER_COLOR: &'static str = "setBorderColor";
    pub const SET_BORDER_ALPHA: &'static str = "setBorderAlpha";
    pub const SET_BORDER_DEFAULT: &'static str = "setBorderDefault";
    pub const GET_COLOR_MAPS: &'static str = "getColorMaps";

    pub fn register(manager: &mut ObjectManager) -> bool {
        let Ok(class_name) = ClassName::new(Self::CLASS_NAME) else {
            return false;
        };
        manager.register_class(class_name, |core| Ok(Box::new(Self::new(core)?)))
    }

    fn new(mut core: ObjectCore) -> RegistryResult<Self> {
        let state = core.state_mut();
        state.insert_value(COLOR_MAP_NAME, "Gray")?;
        state.insert_value(REVERSE, false)?;
        state.insert_value(INVERT, false)?;
        state.insert_value(NAN_DEFAULT, true)?;
        state.insert_value(BORDER_DEFAULT, true)?;

        state.insert_value(GAMMA, 1.0)?;
        state.insert_value(SCALE_1, 0.0)?;
        state.insert_value(SCALE_2, 0.0)?;

        state.insert_object(COLOR_MIX)?;
        for channel in [RED, GREEN, BLUE] {
            state.insert_value(&lookup(&[COLOR_MIX, channel]), 1.0)?;
        }

        state.insert_value(TRANSFORM_IMAGE, DEFAULT_IMAGE_TRANSFORM)?;
        state.insert_value(TRANSFORM_DATA, DATA_TRANSFORMS[0])?;

        state.insert_object(NAN_COLOR)?;
        for (channel, amount) in [(RED, 255), (GREEN, 0), (BLUE, 0), (ALPHA, 255)] {
            state.insert_value(&lookup(&[NAN_COLOR, channel]), amount)?;
        }

        state.insert_object(BORDER_COLOR)?;
        for (channel, amount) in [(RED, 0), (GREEN, 0), (BLUE, 0), (ALPHA, 255)] {
            state.insert_value(&lookup(&[BORDER_COLOR, channel]), amount)?;
        }

        state.flush_state();
        Ok(Self { core })
    }

    // ---- Accessors ----

    pub fn color_map_name(&self) -> RegistryResult<String> {
        Ok(self.core.state().get_value(COLOR_MAP_NAME)?)
    }

    pub fn is_reversed(&self) -> RegistryResult<bool> {
        Ok(self.core.state().get_value(REVERSE)?)
    }

    pub fn is_inverted(&self) -> RegistryResult<bool> {
        Ok(self.core.state().get_value(INVERT)?)
    }

    pub fn gamma(&self) -> RegistryResult<f64> {
        Ok(self.core.state().get_value(GAMMA)?)
    }

    pub fn scales(&self) -> RegistryResult<(f64, f64)> {
        let state = self.core.state();
        Ok((state.get_value(SCALE_1)?, state.get_value(SCALE_2)?))
    }

    pub fn data_transform(&self) -> RegistryResult<String> {
        Ok(self.core.state().get_value(TRANSFORM_DATA)?)
    }

    /// Red, green, and blue mix fractions.
    pub fn color_mix(&self) -> RegistryResult<[f64; 3]> {
        let state = self.core.state();
        Ok([
            state.get_value(&lookup(&[COLOR_MIX, RED]))?,
            state.get_value(&lookup(&[COLOR_MIX, GREEN]))?,
            state.get_value(&lookup(&[COLOR_MIX, BLUE]))?,
        ])
    }

    /// NaN pixel color as red, green, blue, alpha.
    pub fn nan_color(&self) -> RegistryResult<[i64; 4]> {
        self.rgba(NAN_COLOR)
    }

    /// Border color as red, green, blue, alpha.
    pub fn border_color(&self) -> RegistryResult<[i64; 4]> {
        self.rgba(BORDER_COLOR)
    }

    fn rgba(&self, major: &str) -> RegistryResult<[i64; 4]> {
        let state = self.core.state();
        Ok([
            state.get_value(&lookup(&[major, RED]))?,
            state.get_value(&lookup(&[major, GREEN]))?,
            state.get_value(&lookup(&[major, BLUE]))?,
            state.get_value(&lookup(&[major, ALPHA]))?,
        ])
    }

    // ---- Setters ----

    pub fn set_color_map(&mut self, name: &str) -> RegistryResult<()> {
        if !COLOR_MAPS.contains(&name) {
            return Err(RegistryError::Rejected(format!("Invalid colormap: {name}")));
        }
        self.set_and_flush(COLOR_MAP_NAME, name)
    }

    pub fn set_reversed(&mut self, reverse: bool) -> RegistryResult<()> {
        self.set_and_flush(REVERSE, reverse)
    }

    pub fn set_inverted(&mut self, invert: bool) -> RegistryResult<()> {
        self.set_and_flush(INVERT, invert)
    }

    pub fn set_gamma(&mut self, gamma: f64) -> RegistryResult<()> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(RegistryError::InvalidParameter {
                name: GAMMA.into(),
                reason: format!("must be positive, got {gamma}"),
            });
        }
        if self.set_rounded(GAMMA, gamma)? {
            self.core.state_mut().flush_state();
        }
        Ok(())
    }

    /// Set both gamma scale parameters. Nothing changes unless both are
    /// finite.
    pub fn set_scales(&mut self, scale1: f64, scale2: f64) -> RegistryResult<()> {
        for (name, value) in [(SCALE_1, scale1), (SCALE_2, scale2)] {
            if !value.is_finite() {
                return Err(RegistryError::InvalidParameter {
                    name: name.into(),
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        let first = self.set_rounded(SCALE_1, scale1)?;
        let second = self.set_rounded(SCALE_2, scale2)?;
        if first || second {
            self.core.state_mut().flush_state();
        }
        Ok(())
    }

    /// Copy every user setting of one live `ColorState` into another and
    /// notify the target's subscribers.
    pub fn replicate(
        manager: &mut ObjectManager,
        source: ObjectId,
        target: ObjectId,
    ) -> RegistryResult<()> {
        let settings = Self::lookup_in(manager, source)?.settings()?;
        Self::lookup_in(manager, target)?;
        manager
            .get_as_mut::<ColorState>(target)
            .ok_or_else(|| RegistryError::ObjectNotFound { id: target.to_string() })?
            .apply_settings(settings)
    }

    fn lookup_in(manager: &ObjectManager, id: ObjectId) -> RegistryResult<&ColorState> {
        let object = manager
            .get_object(id)
            .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
        object
            .as_any()
            .downcast_ref::<ColorState>()
            .ok_or_else(|| RegistryError::ClassMismatch {
                expected: Self::CLASS_NAME.to_string(),
                actual: object.class_name().to_string(),
            })
    }

    fn settings(&self) -> RegistryResult<Vec<(&'static str, Value)>> {
        let state = self.core.state();
        REPLICATED
            .iter()
            .map(|key| -> RegistryResult<(&'static str, Value)> {
                Ok((*key, state.get_value::<Value>(key)?))
            })
            .collect()
    }

    fn apply_settings(&mut self, settings: Vec<(&'static str, Value)>) -> RegistryResult<()> {
        let state = self.core.state_mut();
        for (key, value) in settings {
            state.set_value(key, value)?;
        }
        state.flush_state();
        Ok(())
    }

    /// Store `value` rounded to [`SIGNIFICANT_DIGITS`] unless it is within
    /// [`ERROR_MARGIN`] of the current value. Returns whether it changed.
    fn set_rounded(&mut self, key: &str, value: f64) -> RegistryResult<bool> {
        let rounded = round_to_digits(value, SIGNIFICANT_DIGITS);
        let old: f64 = self.core.state().get_value(key)?;
        if (rounded - old).abs() <= ERROR_MARGIN {
            return Ok(false);
        }
        Ok(self.core.state_mut().set_value(key, rounded)?)
    }

    /// Select a data transform, matched case-insensitively and stored with
    /// its canonical spelling.
    pub fn set_data_transform(&mut self, name: &str) -> RegistryResult<()> {
        let canonical = DATA_TRANSFORMS
            .iter()
            .find(|t| t.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| RegistryError::Rejected(format!("Invalid data transform: {name}")))?;
        self.set_and_flush(TRANSFORM_DATA, *canonical)
    }

    /// Set the mix fractions. Valid channels are applied even when others
    /// are rejected; the rejection lists every bad channel.
    pub fn set_color_mix(&mut self, red: f64, green: f64, blue: f64) -> RegistryResult<()> {
        let mut errors = Vec::new();
        for (channel, fraction) in [(RED, red), (GREEN, green), (BLUE, blue)] {
            if !(0.0..=1.0).contains(&fraction) {
                errors.push(format!("Mix color {channel} must be in [0,1]."));
                continue;
            }
            let key = lookup(&[COLOR_MIX, channel]);
            let old: f64 = self.core.state().get_value(&key)?;
            if (fraction - old).abs() >= MIX_TOLERANCE {
                self.core.state_mut().set_value(&key, fraction)?;
            }
        }
        self.core.state_mut().flush_state();
        rejected(errors)
    }

    pub fn set_nan_color(&mut self, red: i64, green: i64, blue: i64) -> RegistryResult<()> {
        let mut errors = Vec::new();
        for (channel, amount) in [(RED, red), (GREEN, green), (BLUE, blue)] {
            self.set_channel(NAN_COLOR, "Nan color", channel, amount, &mut errors)?;
        }
        self.core.state_mut().flush_state();
        rejected(errors)
    }

    pub fn set_nan_default(&mut self, use_default: bool) -> RegistryResult<()> {
        self.set_and_flush(NAN_DEFAULT, use_default)
    }

    pub fn set_border_color(&mut self, red: i64, green: i64, blue: i64) -> RegistryResult<()> {
        let mut errors = Vec::new();
        for (channel, amount) in [(RED, red), (GREEN, green), (BLUE, blue)] {
            self.set_channel(BORDER_COLOR, "Border background", channel, amount, &mut errors)?;
        }
        self.core.state_mut().flush_state();
        rejected(errors)
    }

    pub fn set_border_alpha(&mut self, alpha: i64) -> RegistryResult<()> {
        let mut errors = Vec::new();
        self.set_channel(BORDER_COLOR, "Border background", ALPHA, alpha, &mut errors)?;
        self.core.state_mut().flush_state();
        rejected(errors)
    }

    /// Toggle the default border. Any change resets the border to opaque
    /// black.
    pub fn set_border_default(&mut self, use_default: bool) -> RegistryResult<()> {
        if !self.core.state_mut().set_value(BORDER_DEFAULT, use_default)? {
            return Ok(());
        }
        self.set_border_color(0, 0, 0)?;
        self.set_border_alpha(255)
    }

    fn set_channel(
        &mut self,
        major: &str,
        label: &str,
        channel: &str,
        amount: i64,
        errors: &mut Vec<String>,
    ) -> RegistryResult<bool> {
        if !(0..=255).contains(&amount) {
            errors.push(format!("{label} {channel} must be in [0,255]."));
            return Ok(false);
        }
        Ok(self
            .core
            .state_mut()
            .set_value(&lookup(&[major, channel]), amount)?)
    }

    fn set_and_flush<T: serde::Serialize>(&mut self, key: &str, value: T) -> RegistryResult<()> {
        let state = self.core.state_mut();
        if state.set_value(key, value)? {
            state.flush_state();
        }
        Ok(())
    }

    fn run_command(&mut self, command: &str, parameters: &str) -> RegistryResult<String> {
        match command {
            Self::SET_COLOR_MAP => {
                let params = parse_params(parameters, &["name"])?;
                self.set_color_map(&params["name"])?;
            }
            Self::REVERSE_COLOR_MAP => {
                let params = parse_params(parameters, &[REVERSE])?;
                self.set_reversed(param(&params, REVERSE)?)?;
            }
            Self::INVERT_COLOR_MAP => {
                let params = parse_params(parameters, &[INVERT])?;
                self.set_inverted(param(&params, INVERT)?)?;
            }
            Self::SET_COLOR_MIX => {
                let params = parse_params(parameters, &[RED, GREEN, BLUE])?;
                self.set_color_mix(
                    param(&params, RED)?,
                    param(&params, GREEN)?,
                    param(&params, BLUE)?,
                )?;
            }
            Self::SET_GAMMA => {
                let params = parse_params(parameters, &[GAMMA])?;
                self.set_gamma(param(&params, GAMMA)?)?;
            }
            Self::SET_SCALES => {
                let params = parse_params(parameters, &[SCALE_1, SCALE_2])?;
                self.set_scales(param(&params, SCALE_1)?, param(&params, SCALE_2)?)?;
            }
            Self::SET_DATA_TRANSFORM => {
                let params = parse_params(parameters, &[TRANSFORM_DATA])?;
                self.set_data_transform(&params[TRANSFORM_DATA])?;
            }
            Self::SET_NAN_COLOR => {
                let params = parse_params(parameters, &[RED, GREEN, BLUE])?;
                self.set_nan_color(
                    param(&params, RED)?,
                    param(&params, GREEN)?,
                    param(&params, BLUE)?,
                )?;
            }
            Self::SET_NAN_DEFAULT => {
                let params = parse_params(parameters, &[NAN_DEFAULT])?;
                self.set_nan_default(param(&params, NAN_DEFAULT)?)?;
            }
            Self::SET_BORDER_COLOR => {
                let params = parse_params(parameters, &[RED, GREEN, BLUE])?;
                self.set_border_color(
                    param(&params, RED)?,
                    param(&params, GREEN)?,
                    param(&params, BLUE)?,
                )?;
            }
            Self::SET_BORDER_ALPHA => {
                let params = parse_params(parameters, &[ALPHA])?;
                self.set_border_alpha(param(&params, ALPHA)?)?;
            }
            Self::SET_BORDER_DEFAULT => {
                let params = parse_params(parameters, &[BORDER_DEFAULT])?;
                self.set_border_default(param(&params, BORDER_DEFAULT)?)?;
            }
            Self::GET_COLOR_MAPS => return Ok(COLOR_MAPS.join(",")),
            _ => {
                return Err(RegistryError::UnknownCommand {
                    class_name: Self::CLASS_NAME.to_string(),
                    command: command.to_string(),
                });
            }
        }
        Ok(String::new())
    }
}

fn round_to_digits(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

fn rejected(errors: Vec<String>) -> RegistryResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::Rejected(errors.join(" ")))
    }
}

impl CartaObject for ColorState {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// Only user preferences are persisted.
    fn state_string(&self, kind: SnapshotKind) -> String {
        match kind {
            SnapshotKind::Preferences => self.core.state().to_string(),
            SnapshotKind::Layout | SnapshotKind::Data => String::new(),
        }
    }

    fn handle_command(&mut self, command: &str, parameters: &str, session_id: &str) -> RegistryResult<String> {
        let result = self.run_command(command, parameters);
        if let Err(e) = &result {
            tracing::debug!(id = %self.id(), command, session = session_id, error = %e, "color command rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_registry::{ManagerConfig, ObjectId};

    fn setup() -> (ObjectManager, ObjectId) {
        let mut mgr = ObjectManager::new(ManagerConfig::default()).unwrap();
        assert!(ColorState::register(&mut mgr));
        let id = mgr.create_object(ColorState::CLASS_NAME).unwrap();
        (mgr, id)
    }

    fn send(mgr: &mut ObjectManager, id: ObjectId, command: &str, params: &str) -> RegistryResult<String> {
        let full = mgr.get_object(id).unwrap().add_id_to_command(command);
        mgr.dispatch(&full, params, "session-1")
    }

    fn color(mgr: &ObjectManager, id: ObjectId) -> &ColorState {
        mgr.get_as::<ColorState>(id).unwrap()
    }

    #[test]
    fn default_state() {
        let (mgr, id) = setup();
        let cs = color(&mgr, id);
        assert_eq!(cs.color_map_name().unwrap(), "Gray");
        assert!(!cs.is_reversed().unwrap());
        assert!(!cs.is_inverted().unwrap());
        assert_eq!(cs.gamma().unwrap(), 1.0);
        assert_eq!(cs.color_mix().unwrap(), [1.0, 1.0, 1.0]);
        assert_eq!(cs.nan_color().unwrap(), [255, 0, 0, 255]);
        assert_eq!(cs.border_color().unwrap(), [0, 0, 0, 255]);
        assert_eq!(cs.data_transform().unwrap(), "None");
        assert!(!cs.core().state().is_dirty());
    }

    #[test]
    fn select_colormap() {
        let (mut mgr, id) = setup();
        assert_eq!(send(&mut mgr, id, ColorState::SET_COLOR_MAP, "name:Heat").unwrap(), "");
        assert_eq!(color(&mgr, id).color_map_name().unwrap(), "Heat");

        let err = send(&mut mgr, id, ColorState::SET_COLOR_MAP, "name:Neon").unwrap_err();
        assert_eq!(err.to_string(), "Invalid colormap: Neon");
        assert_eq!(color(&mgr, id).color_map_name().unwrap(), "Heat");
    }

    #[test]
    fn list_colormaps() {
        let (mut mgr, id) = setup();
        let reply = send(&mut mgr, id, ColorState::GET_COLOR_MAPS, "").unwrap();
        assert!(reply.starts_with("Gray,Heat,"));
        assert_eq!(reply.split(',').count(), COLOR_MAPS.len());
    }

    #[test]
    fn reverse_and_invert() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::REVERSE_COLOR_MAP, "reverse:true").unwrap();
        send(&mut mgr, id, ColorState::INVERT_COLOR_MAP, "invert:true").unwrap();
        assert!(color(&mgr, id).is_reversed().unwrap());
        assert!(color(&mgr, id).is_inverted().unwrap());

        let err = send(&mut mgr, id, ColorState::REVERSE_COLOR_MAP, "reverse:yes").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameter { .. }));
    }

    #[test]
    fn color_mix_validation_applies_good_channels() {
        let (mut mgr, id) = setup();
        let err = send(&mut mgr, id, ColorState::SET_COLOR_MIX, "red:0.5,green:1.5,blue:-1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mix color green must be in [0,1]. Mix color blue must be in [0,1]."
        );
        assert_eq!(color(&mgr, id).color_mix().unwrap(), [0.5, 1.0, 1.0]);
    }

    #[test]
    fn tiny_mix_changes_are_ignored() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_COLOR_MIX, "red:0.9995,green:1,blue:1").unwrap();
        assert_eq!(color(&mgr, id).color_mix().unwrap(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn gamma_must_be_positive() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:2.2").unwrap();
        assert_eq!(color(&mgr, id).gamma().unwrap(), 2.2);
        assert!(send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:0").is_err());
        assert!(send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:-3").is_err());
        assert!(matches!(
            send(&mut mgr, id, ColorState::SET_GAMMA, ""),
            Err(RegistryError::MissingParameter { .. })
        ));
    }

    #[test]
    fn scales() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_SCALES, "scale1:0.25,scale2:4").unwrap();
        let state = color(&mgr, id).core().state();
        assert_eq!(state.get_value::<f64>("scale1").unwrap(), 0.25);
        assert_eq!(state.get_value::<f64>("scale2").unwrap(), 4.0);
    }

    #[test]
    fn non_finite_scales_are_rejected() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_SCALES, "scale1:0.5,scale2:2").unwrap();
        for params in ["scale1:NaN,scale2:1", "scale1:1,scale2:inf", "scale1:-inf,scale2:NaN"] {
            let err = send(&mut mgr, id, ColorState::SET_SCALES, params).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidParameter { .. }), "{params}");
        }
        assert_eq!(color(&mgr, id).scales().unwrap(), (0.5, 2.0));
        assert!(!color(&mgr, id).core().state().is_dirty());
    }

    #[test]
    fn gamma_and_scales_are_rounded() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:1.23456789").unwrap();
        assert_eq!(color(&mgr, id).gamma().unwrap(), 1.23457);

        // Rounds to the stored value, so nothing changes.
        send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:1.2345704").unwrap();
        assert_eq!(color(&mgr, id).gamma().unwrap(), 1.23457);

        send(&mut mgr, id, ColorState::SET_SCALES, "scale1:0.000123456789,scale2:-98765.4321").unwrap();
        assert_eq!(color(&mgr, id).scales().unwrap(), (0.000123457, -98765.4));
    }

    #[test]
    fn replicate_copies_settings() {
        let (mut mgr, source) = setup();
        let target = mgr.create_object(ColorState::CLASS_NAME).unwrap();
        send(&mut mgr, source, ColorState::SET_COLOR_MAP, "name:Magma").unwrap();
        send(&mut mgr, source, ColorState::INVERT_COLOR_MAP, "invert:true").unwrap();
        send(&mut mgr, source, ColorState::SET_NAN_COLOR, "red:1,green:2,blue:3").unwrap();
        send(&mut mgr, source, ColorState::SET_BORDER_ALPHA, "alpha:7").unwrap();

        ColorState::replicate(&mut mgr, source, target).unwrap();
        let copy = color(&mgr, target);
        assert_eq!(copy.color_map_name().unwrap(), "Magma");
        assert!(copy.is_inverted().unwrap());
        assert_eq!(copy.nan_color().unwrap(), [1, 2, 3, 255]);
        assert_eq!(copy.border_color().unwrap(), [0, 0, 0, 7]);
        assert!(!copy.core().state().is_dirty());
        assert_eq!(color(&mgr, source).core().state().root(), copy.core().state().root());
    }

    #[test]
    fn replicate_needs_two_color_states() {
        let (mut mgr, source) = setup();
        crate::ExampleObject::register(&mut mgr);
        let other = mgr.create_object(crate::ExampleObject::CLASS_NAME).unwrap();

        assert!(matches!(
            ColorState::replicate(&mut mgr, source, other),
            Err(RegistryError::ClassMismatch { .. })
        ));
        assert!(matches!(
            ColorState::replicate(&mut mgr, source, ObjectId::new(99)),
            Err(RegistryError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn data_transform_is_canonicalized() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_DATA_TRANSFORM, "dataTransform:square root").unwrap();
        assert_eq!(color(&mgr, id).data_transform().unwrap(), "Square Root");
        let err = send(&mut mgr, id, ColorState::SET_DATA_TRANSFORM, "dataTransform:Cube").unwrap_err();
        assert_eq!(err.to_string(), "Invalid data transform: Cube");
    }

    #[test]
    fn nan_color_range() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_NAN_COLOR, "red:10,green:20,blue:30").unwrap();
        assert_eq!(color(&mgr, id).nan_color().unwrap(), [10, 20, 30, 255]);

        let err = send(&mut mgr, id, ColorState::SET_NAN_COLOR, "red:256,green:0,blue:0").unwrap_err();
        assert_eq!(err.to_string(), "Nan color red must be in [0,255].");
        assert_eq!(color(&mgr, id).nan_color().unwrap(), [10, 0, 0, 255]);

        send(&mut mgr, id, ColorState::SET_NAN_DEFAULT, "nanDefault:false").unwrap();
        assert!(!color(&mgr, id).core().state().get_value::<bool>("nanDefault").unwrap());
    }

    #[test]
    fn border_default_resets_border() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_BORDER_COLOR, "red:1,green:2,blue:3").unwrap();
        send(&mut mgr, id, ColorState::SET_BORDER_ALPHA, "alpha:100").unwrap();
        assert_eq!(color(&mgr, id).border_color().unwrap(), [1, 2, 3, 100]);

        // Unchanged flag leaves the border alone.
        send(&mut mgr, id, ColorState::SET_BORDER_DEFAULT, "borderDefault:true").unwrap();
        assert_eq!(color(&mgr, id).border_color().unwrap(), [1, 2, 3, 100]);

        send(&mut mgr, id, ColorState::SET_BORDER_DEFAULT, "borderDefault:false").unwrap();
        assert_eq!(color(&mgr, id).border_color().unwrap(), [0, 0, 0, 255]);

        let err = send(&mut mgr, id, ColorState::SET_BORDER_ALPHA, "alpha:-1").unwrap_err();
        assert_eq!(err.to_string(), "Border background alpha must be in [0,255].");
    }

    #[test]
    fn subscribers_see_one_flush_per_command() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let (mut mgr, id) = setup();
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        mgr.get_object_mut(id)
            .unwrap()
            .core_mut()
            .state_mut()
            .add_state_callback("colorMix", move |_, _| {
                sink.fetch_add(1, Ordering::SeqCst);
            });

        send(&mut mgr, id, ColorState::SET_COLOR_MIX, "red:0.1,green:0.2,blue:0.3").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        send(&mut mgr, id, ColorState::SET_GAMMA, "gamma:3").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn only_preferences_are_snapshotted() {
        let (mut mgr, id) = setup();
        send(&mut mgr, id, ColorState::SET_COLOR_MAP, "name:Viridis").unwrap();

        assert!(mgr.snapshot(SnapshotKind::Layout).unwrap().objects.is_empty());
        let prefs = mgr.snapshot(SnapshotKind::Preferences).unwrap();
        assert_eq!(prefs.objects[0].state["colorMapName"], "Viridis");

        send(&mut mgr, id, ColorState::SET_COLOR_MAP, "name:Jet").unwrap();
        mgr.restore(&prefs).unwrap();
        assert_eq!(color(&mgr, id).color_map_name().unwrap(), "Viridis");
    }

    proptest::proptest! {
        #[test]
        fn nan_channels_stay_in_range(r in -300i64..600, g in -300i64..600, b in -300i64..600) {
            let (mut mgr, id) = setup();
            let params = format!("red:{r},green:{g},blue:{b}");
            let result = send(&mut mgr, id, ColorState::SET_NAN_COLOR, &params);
            let all_valid = [r, g, b].iter().all(|v| (0..=255).contains(v));
            proptest::prop_assert_eq!(result.is_ok(), all_valid);
            for channel in color(&mgr, id).nan_color().unwrap() {
                proptest::prop_assert!((0..=255).contains(&channel));
            }
        }
    }
}
