//! Exam Report - CSV statistics and charts for student exam records
//!
//! Reads the exam table, counts gender and father-education categories,
//! averages the global score per department, and writes three charts plus
//! the computed tables as CSV.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod report;
pub mod stats;
