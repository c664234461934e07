pub mod capture;
pub mod output;
pub mod sensor;
