pub mod analyzer;
pub mod comparison;
pub mod correlation;
pub mod error;
pub mod missing;
pub mod normality;
pub mod outliers;
pub mod rolling;
pub mod skewness;
pub mod summary;
