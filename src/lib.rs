//! Weekly academic timetable generation.
//!
//! [`generator::generate_timetable`] turns courses, teachers and rooms into a
//! clash-free [`data::WeeklyGrid`]; [`server`] exposes it over HTTP together
//! with an in-memory [`store::TimetableStore`].

pub mod config;
pub mod data;
pub mod generator;
pub mod server;
pub mod store;

pub use data::{Course, GenerationOutput, GenerationRequest, Room, Teacher, WeeklyGrid};
pub use generator::generate_timetable;
