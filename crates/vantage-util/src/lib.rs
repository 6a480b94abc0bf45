pub mod fs;
pub mod ui;

pub use crate::fs::{read_json, write_csv_atomic, write_json_atomic, write_records_atomic};
pub use crate::ui::single_pb;
