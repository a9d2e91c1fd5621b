//! Run parameter validation.
//!
//! Out-of-range values are rejected here, before a run is dispatched;
//! the optimizer only ever sees validated parameters.

use crate::error::CoreError;

/// Upper bound on the shapes a single run may commit.
pub const MAX_SHAPE_COUNT: u32 = 1_000;

/// Shape category the optimizer searches over, keyed by wire mode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Mode 0: a random concrete kind is drawn per step.
    Combo,
    /// Mode 1.
    Triangle,
    /// Mode 2: axis-aligned.
    Rectangle,
    /// Mode 3: axis-aligned.
    Ellipse,
    /// Mode 4.
    Circle,
}

impl ShapeKind {
    pub fn from_mode(mode: i64) -> Result<Self, CoreError> {
        match mode {
            0 => Ok(Self::Combo),
            1 => Ok(Self::Triangle),
            2 => Ok(Self::Rectangle),
            3 => Ok(Self::Ellipse),
            4 => Ok(Self::Circle),
            other => Err(CoreError::Validation(format!(
                "Unsupported shape mode {other}; expected 0-4"
            ))),
        }
    }
}

/// Validated parameters for one approximation run.
#[derive(Debug, Clone, Copy)]
pub struct ProcessParams {
    pub count: u32,
    pub kind: ShapeKind,
    pub alpha: u8,
}

impl ProcessParams {
    /// Validate raw wire values.
    ///
    /// `count` must be within `1..=MAX_SHAPE_COUNT`, `mode` a known kind,
    /// `alpha` within `0..=255` (0 lets the optimizer choose).
    pub fn validate(count: i64, mode: i64, alpha: i64) -> Result<Self, CoreError> {
        if !(1..=MAX_SHAPE_COUNT as i64).contains(&count) {
            return Err(CoreError::Validation(format!(
                "Shape count must be between 1 and {MAX_SHAPE_COUNT}, got {count}"
            )));
        }
        let kind = ShapeKind::from_mode(mode)?;
        if !(0..=255).contains(&alpha) {
            return Err(CoreError::Validation(format!(
                "Alpha must be between 0 and 255, got {alpha}"
            )));
        }
        Ok(Self {
            count: count as u32,
            kind,
            alpha: alpha as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn valid_params_accepted() {
        let params = ProcessParams::validate(10, 1, 128).unwrap();
        assert_eq!(params.count, 10);
        assert_eq!(params.kind, ShapeKind::Triangle);
        assert_eq!(params.alpha, 128);
    }

    #[test]
    fn zero_alpha_accepted() {
        let params = ProcessParams::validate(1, 0, 0).unwrap();
        assert_eq!(params.kind, ShapeKind::Combo);
        assert_eq!(params.alpha, 0);
    }

    #[test]
    fn negative_count_rejected() {
        assert_matches!(
            ProcessParams::validate(-1, 1, 128),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn zero_count_rejected() {
        assert_matches!(
            ProcessParams::validate(0, 1, 128),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn count_above_cap_rejected() {
        assert_matches!(
            ProcessParams::validate(MAX_SHAPE_COUNT as i64 + 1, 1, 128),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unknown_mode_rejected() {
        assert_matches!(
            ProcessParams::validate(10, 5, 128),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            ProcessParams::validate(10, -1, 128),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn out_of_range_alpha_rejected() {
        assert_matches!(
            ProcessParams::validate(10, 1, 256),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            ProcessParams::validate(10, 1, -1),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn all_modes_map_to_kinds() {
        assert_eq!(ShapeKind::from_mode(0).unwrap(), ShapeKind::Combo);
        assert_eq!(ShapeKind::from_mode(1).unwrap(), ShapeKind::Triangle);
        assert_eq!(ShapeKind::from_mode(2).unwrap(), ShapeKind::Rectangle);
        assert_eq!(ShapeKind::from_mode(3).unwrap(), ShapeKind::Ellipse);
        assert_eq!(ShapeKind::from_mode(4).unwrap(), ShapeKind::Circle);
    }
}
