// Calibration module - sound level meter offset and calibration tone
//
// The calibration workflow:
// 1. Play the calibration tone at cal_level_db (dB FS)
// 2. Read the SPL from a sound level meter at the listening position
// 3. record_reading() stores slm_offset = reading - cal_level_db
// 4. level_for(desired SPL) yields the dB FS level for each trial

pub mod model;

pub use model::{
    calc_level, calc_offset, calibration_tone, write_calibration_tone, CalibrationModel,
};
