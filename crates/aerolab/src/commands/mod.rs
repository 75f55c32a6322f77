pub mod attach;
pub mod cluster;
pub mod files;
pub mod inventory;
pub mod logs;
pub mod volumes;
