//! Run orchestration per rule domain.

mod budget;
mod disable;
mod scaling;
