pub mod config;
pub mod privileges;
pub mod runner;
pub mod shell;
pub mod systemd;
