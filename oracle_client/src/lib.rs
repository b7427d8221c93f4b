// oracle_leaks/oracle_client/src/lib.rs

pub mod attack;
pub mod client;

pub use attack::{recover_padded, AttackError, LengthOracle, LocalOracle, Recovery};
pub use client::{ClientError, OracleClient};
