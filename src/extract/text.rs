use super::{ExtractError, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Formatting knobs for the plain-text export.
#[derive(Clone, Debug, Default)]
pub struct TextOptions {
    /// Line written after each record, e.g. a rule of dashes.
    pub separator: String,
    /// Literal `(from, to)` substitutions applied to every value.
    pub replacements: Vec<(String, String)>,
    /// Write each field key as an uppercase heading line.
    pub write_keys: bool,
}

/// Append one record to a text file, one value per line.
pub fn append_record(
    path: &Path,
    record: &Record,
    options: &TextOptions,
) -> Result<(), ExtractError> {
    let mut out = String::new();

    for (key, values) in record.fields() {
        if options.write_keys {
            out.push_str(&key.to_uppercase());
            out.push_str(":\n");
        }
        for value in values {
            let mut line = value.clone();
            for (from, to) in &options.replacements {
                line = line.replace(from.as_str(), to.as_str());
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&options.separator);
    out.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(out.as_bytes())?;
    Ok(())
}
