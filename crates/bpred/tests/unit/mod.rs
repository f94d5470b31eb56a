//! # Unit Components
//!
//! Tests for each structure of the prediction unit, from configuration
//! parsing up to the composed façade.
