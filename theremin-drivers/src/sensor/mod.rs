//! Distance sensors

pub mod median;
pub mod ultrasonic;

pub use median::median;
pub use ultrasonic::{
    max_travel_time, speed_of_sound, Phase, RangingStats, UltrasonicSensor, INIT_SETTLE,
    TRIGGER_PULSE,
};
