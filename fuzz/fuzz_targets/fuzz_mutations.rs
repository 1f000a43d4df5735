#![no_main]

use dbc_diff::CatalogReader;
use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_database_content(data: &[u8]) -> Vec<u8> {
    let base = r#"VERSION "1.0"

NS_ :
	CM_
	BA_DEF_

BU_: ECU DASH

BO_ 256 Engine: 8 ECU
 SG_ Speed : 0|16@1+ (0.25,0) [0|16383.75] "rpm" DASH
 SG_ Mode M : 16|2@1+ (1,0) [0|3] "" DASH
BO_TX_BU_ 256 : ECU,DASH;
BA_DEF_ BO_ "GenMsgCycleTime" INT 0 65535;
BA_DEF_DEF_ "GenMsgCycleTime" 0;
BA_ "GenMsgCycleTime" BO_ 256 100;
VAL_ 256 Mode 0 "Off" 1 "Run" ;"#;

    let mut result = base.as_bytes().to_vec();

    if data.is_empty() {
        return result;
    }

    let max_size = 4096;

    for &byte in data.iter().take(16) {
        if result.len() > max_size {
            break;
        }

        match byte % 8 {
            0 => {
                let pos = (byte as usize) % result.len().max(1);
                result.truncate(pos);
            }
            1 => {
                // Not valid UTF-8, forces the Latin-1 fallback
                let pos = (byte as usize) % (result.len() + 1);
                result.insert(pos, 0xFF);
            }
            2 => {
                if let Some(pos) = result.iter().position(|&b| b == b'"') {
                    result[pos] = b'X';
                }
            }
            3 => {
                let pos = (byte as usize) % (result.len() + 1);
                result.insert(pos, b'\n');
            }
            4 => {
                if let Some(pos) = result.iter().position(|&b| b == b';' || b == b'|') {
                    result[pos] = b'?';
                }
            }
            5 => {
                let pos = (byte as usize) % (result.len() + 1);
                result.insert(pos, byte);
            }
            6 => {
                // Drop the first colon, breaks BO_ or SG_ headers
                if let Some(pos) = result.iter().position(|&b| b == b':') {
                    result.remove(pos);
                }
            }
            _ => {
                // Duplicate the tail, repeats messages and signals
                let pos = (byte as usize) % result.len().max(1);
                let tail = result[pos..].to_vec();
                result.extend_from_slice(&tail);
            }
        }
    }

    result
}

fuzz_target!(|data: &[u8]| {
    let content = create_database_content(data);

    if let Ok(mut temp_file) = NamedTempFile::new() {
        if temp_file.write_all(&content).is_ok() {
            if let Ok(result) = CatalogReader::new(temp_file.path()).read() {
                assert!(!result.diagnostics.has_fatal());
            }
        }
    }
});
