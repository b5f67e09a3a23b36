#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod clock;
pub mod config;
pub mod coord;
pub mod directory;
pub mod error;
pub mod event;
pub mod force;
pub mod move_buffer;
pub mod move_record;
pub mod piece;
pub mod player;
pub mod rules;
pub mod session;
pub mod test_util;
pub mod transport;
pub mod utc_time;
pub mod util;
