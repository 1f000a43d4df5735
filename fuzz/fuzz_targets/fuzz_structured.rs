#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use dbc_diff::{diff_catalogs, Action, CatalogReader};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzDatabase {
    version: Option<String>,
    nodes: Vec<String>,
    messages: Vec<FuzzMessage>,
    trailing: Vec<FuzzStatement>,
}

#[derive(Arbitrary, Debug)]
struct FuzzMessage {
    frame_id: u32,
    name: String,
    length: u8,
    sender: String,
    signals: Vec<FuzzSignal>,
}

#[derive(Arbitrary, Debug)]
struct FuzzSignal {
    name: String,
    multiplex: Option<u8>,
    start: u16,
    length: u8,
    big_endian: bool,
    signed: bool,
    scale: f32,
    offset: i16,
    minimum: i32,
    maximum: i32,
    unit: String,
    receivers: Vec<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzStatement {
    Choices {
        frame_id: u32,
        signal: String,
        entries: Vec<(i32, String)>,
    },
    Attribute {
        name: String,
        frame_id: u32,
        value: i64,
    },
    SignalAttribute {
        name: String,
        frame_id: u32,
        signal: String,
        value: f64,
    },
    Senders {
        frame_id: u32,
        senders: Vec<String>,
    },
    FloatSignal {
        frame_id: u32,
        signal: String,
        kind: u8,
    },
    Garbage(String),
}

impl FuzzDatabase {
    fn generate_dbc(&self) -> String {
        let mut lines = Vec::new();

        if let Some(version) = &self.version {
            lines.push(format!("VERSION \"{}\"", version));
        }
        lines.push(format!("BU_: {}", self.nodes.join(" ")));

        for message in &self.messages {
            lines.push(format!(
                "BO_ {} {}: {} {}",
                message.frame_id, message.name, message.length, message.sender
            ));
            for signal in &message.signals {
                let multiplex = match signal.multiplex {
                    Some(0) => " M".to_string(),
                    Some(n) => format!(" m{}", n),
                    None => String::new(),
                };
                lines.push(format!(
                    " SG_ {}{} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\" {}",
                    signal.name,
                    multiplex,
                    signal.start,
                    signal.length,
                    if signal.big_endian { 0 } else { 1 },
                    if signal.signed { '-' } else { '+' },
                    signal.scale,
                    signal.offset,
                    signal.minimum,
                    signal.maximum,
                    signal.unit,
                    signal.receivers.join(",")
                ));
            }
        }

        for statement in &self.trailing {
            let line = match statement {
                FuzzStatement::Choices { frame_id, signal, entries } => {
                    let entries: Vec<String> = entries
                        .iter()
                        .map(|(value, label)| format!("{} \"{}\"", value, label))
                        .collect();
                    format!("VAL_ {} {} {} ;", frame_id, signal, entries.join(" "))
                }
                FuzzStatement::Attribute { name, frame_id, value } => {
                    format!("BA_ \"{}\" BO_ {} {};", name, frame_id, value)
                }
                FuzzStatement::SignalAttribute { name, frame_id, signal, value } => {
                    format!("BA_ \"{}\" SG_ {} {} {};", name, frame_id, signal, value)
                }
                FuzzStatement::Senders { frame_id, senders } => {
                    format!("BO_TX_BU_ {} : {};", frame_id, senders.join(","))
                }
                FuzzStatement::FloatSignal { frame_id, signal, kind } => {
                    format!("SIG_VALTYPE_ {} {} : {};", frame_id, signal, kind)
                }
                FuzzStatement::Garbage(text) => text.clone(),
            };
            lines.push(line);
        }

        lines.join("\n")
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    if let Ok(database) = FuzzDatabase::arbitrary(&mut u) {
        let content = database.generate_dbc();
        let result = CatalogReader::new("fuzz.dbc").parse(&content);
        let catalog = &result.catalog;

        // A catalog never differs from itself.
        if let Ok(diff) = diff_catalogs(Some(catalog), Some(catalog)) {
            assert!(diff.is_empty());
            assert!(diff.versions.same_version);
        } else {
            panic!("comparing a catalog with itself failed");
        }

        // Dropping the new side removes every message.
        if let Ok(diff) = diff_catalogs(Some(catalog), None) {
            assert_eq!(diff.messages.len(), catalog.messages.len());
            assert!(diff.messages.values().all(|change| change.action == Action::Removed));
        } else {
            panic!("comparing a catalog with nothing failed");
        }
    }
});
