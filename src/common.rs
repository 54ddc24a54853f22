pub mod db_utils;
pub mod error;
pub mod phone;
pub mod tasks;
