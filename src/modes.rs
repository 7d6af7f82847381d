//! # Flight Mode Names
//!
//! Maps numeric flight-mode codes to names for the two vehicle firmware
//! families that write dataflash logs.

/// Flight-mode name lookup, one function per firmware family
#[cfg_attr(test, mockall::automock)]
pub trait ModeNames {
    /// Fixed-wing firmware; used for mode records carrying `ModeNum`
    fn plane_mode_name(&self, code: i64) -> String;

    /// Multicopter firmware; used for mode records with only `Mode`
    fn copter_mode_name(&self, code: i64) -> String;
}

const PLANE_MODES: &[(i64, &str)] = &[
    (0, "MANUAL"),
    (1, "CIRCLE"),
    (2, "STABILIZE"),
    (3, "TRAINING"),
    (4, "ACRO"),
    (5, "FBWA"),
    (6, "FBWB"),
    (7, "CRUISE"),
    (8, "AUTOTUNE"),
    (10, "AUTO"),
    (11, "RTL"),
    (12, "LOITER"),
    (13, "TAKEOFF"),
    (14, "AVOID_ADSB"),
    (15, "GUIDED"),
    (16, "INITIALISING"),
    (17, "QSTABILIZE"),
    (18, "QHOVER"),
    (19, "QLOITER"),
    (20, "QLAND"),
    (21, "QRTL"),
];

const COPTER_MODES: &[(i64, &str)] = &[
    (0, "STABILIZE"),
    (1, "ACRO"),
    (2, "ALT_HOLD"),
    (3, "AUTO"),
    (4, "GUIDED"),
    (5, "LOITER"),
    (6, "RTL"),
    (7, "CIRCLE"),
    (8, "POSITION"),
    (9, "LAND"),
    (10, "OF_LOITER"),
    (11, "DRIFT"),
    (13, "SPORT"),
    (14, "FLIP"),
    (15, "AUTOTUNE"),
    (16, "POSHOLD"),
    (17, "BRAKE"),
    (18, "THROW"),
    (19, "AVOID_ADSB"),
    (20, "GUIDED_NOGPS"),
    (21, "SMART_RTL"),
];

fn lookup(table: &[(i64, &str)], code: i64) -> String {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Mode({})", code))
}

/// Built-in ArduPlane / ArduCopter mode tables
#[derive(Debug, Clone, Copy, Default)]
pub struct ArduModeNames;

impl ModeNames for ArduModeNames {
    fn plane_mode_name(&self, code: i64) -> String {
        lookup(PLANE_MODES, code)
    }

    fn copter_mode_name(&self, code: i64) -> String {
        lookup(COPTER_MODES, code)
    }
}
