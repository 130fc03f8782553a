pub mod escalator;
pub mod quick;
pub mod scorer;
