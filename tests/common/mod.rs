pub mod synthetic_gear;
