mod atomic_io;
mod collection;
mod database;
mod embedded;
mod error;
mod json_io;
mod version;

pub use atomic_io::{backup_path_for, WriteReceipt};
pub use collection::{Collection, Record, Slot, ValidationError, MAX_COLLECTION_LEN};
pub use database::{Commit, MapCommit, ProjectDatabase};
pub use embedded::{EmbeddedDataDocument, EmbeddedRegionError};
pub use error::{StoreError, StoreErrorKind};
pub use version::{
    ChangeSignal, VersionCoordinator, DEFAULT_VERSION_STEP, SYSTEM_FILE_NAME, VERSION_FIELD,
};
