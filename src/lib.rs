pub mod archive;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod effects;
pub mod error;
pub mod i18n;
pub mod kart;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod session;
pub mod static_files;
pub mod submission;
pub mod sync;
