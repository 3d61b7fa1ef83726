pub mod db;
pub mod project_bmc;

pub use db::*;
pub use project_bmc::*;
