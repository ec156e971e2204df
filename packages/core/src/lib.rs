#![feature(let_chains)]

pub mod bake;
pub mod cache;
pub mod checksum;
pub mod definitions;
pub mod encoding;
pub mod gateway_model;
pub mod log;
pub mod munch;
pub mod parse;
pub mod prelude;
pub mod security;
pub mod serialize;
pub mod state_machine;
pub mod util;
pub mod value_id;
pub mod values;
pub mod wrapping_counter;
