pub mod language;
pub mod models;
pub mod settings;
pub mod speech;
pub mod status;
pub mod translator;
