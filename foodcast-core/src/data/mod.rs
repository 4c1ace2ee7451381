//! Data loading, cleaning and the in-memory price table

pub mod store;
pub mod synthetic;
pub mod table;

pub use store::{DataError, DataSourceConfig, DataStore, LoadReport, ParseIssue};
pub use synthetic::{generate_table, write_csv};
pub use table::{PriceRecord, Table};
