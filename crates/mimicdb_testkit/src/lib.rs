//! # MimicDB Testkit
//!
//! Test fixtures shared by MimicDB's unit and integration tests: wired
//! in-memory databases, canonical store options (the Location / Person /
//! SchoolClass chain), and sample entities.

mod fixtures;

pub use fixtures::{
    init_test_logging, location_options, person_options, sample_location, sample_person,
    sample_school_class, school_class_options, TestDatabase,
};
