//! Tabular feature data: cell values, rows, snapshots and CSV IO

pub mod csv_io;
pub mod snapshot;
pub mod value;

pub use csv_io::{read_snapshot, read_snapshot_from};
pub use snapshot::{IDENTITY_COLUMN, RESERVED_PREFIX, Row, Snapshot};
pub use value::CellValue;
