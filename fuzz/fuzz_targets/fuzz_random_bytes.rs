#![no_main]

use dbc_diff::CatalogReader;
use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::NamedTempFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut temp_file) = NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            // Any input either loads or fails with an error, never a panic.
            let _ = CatalogReader::new(temp_file.path()).read();
        }
    }
});
