mod file_ops;

pub use file_ops::{copy_file, materialize_plan, FileOpError, FileOpResult, MaterializeStats};
