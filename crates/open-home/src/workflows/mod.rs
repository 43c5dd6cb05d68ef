pub mod accounts;
pub mod inspections;
pub mod portfolio;
