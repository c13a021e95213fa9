//! Compile database output

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

use crate::compile_db::CompileCommand;

/// Write records as a JSON array indented by four spaces, with a trailing newline.
pub fn write_json_pretty(commands: &[CompileCommand], mut w: impl Write) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut w, formatter);
    commands.serialize(&mut ser)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_command() -> CompileCommand {
        CompileCommand {
            directory: PathBuf::from("/w/build"),
            command: "cc NODE_GYP_MODULE_NAME ../src/a.cpp".to_string(),
            file: PathBuf::from("/w/src/a.cpp"),
        }
    }

    #[test]
    fn empty_input_is_empty_array() {
        let mut buf = Vec::new();
        write_json_pretty(&[], &mut buf).expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "[]\n");
    }

    #[test]
    fn indents_with_four_spaces() {
        let mut buf = Vec::new();
        write_json_pretty(&[sample_command()], &mut buf).expect("write");

        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("[\n    {\n        \"directory\": \"/w/build\",\n"));
        assert!(text.ends_with("    }\n]\n"));
    }
}
