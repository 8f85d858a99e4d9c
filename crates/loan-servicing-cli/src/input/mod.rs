pub mod file;
pub mod stdin;

use serde_json::Value;

/// Records come from `--input` when given, otherwise from piped stdin.
pub fn read_records(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json_value(path);
    }
    stdin::read_stdin()?
        .ok_or_else(|| "No input: pass --input <file> or pipe JSON on stdin".into())
}
