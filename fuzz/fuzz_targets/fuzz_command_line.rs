//! Fuzz target: `Command::parse` and `Command::rest_from`
//!
//! Feeds arbitrary UTF-8 lines to the console tokenizer.
//!
//! Invariants checked:
//! - No panics under any input
//! - Blank lines never produce a command
//! - Every argument appears in the line, in order
//! - `rest_from(i)` starts with argument `i` and is a suffix of the trimmed line
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use devcycle::app::commands::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let Some(cmd) = Command::parse(line) else {
        assert!(line.trim().is_empty());
        return;
    };
    assert!(!cmd.verb().is_empty());

    let args: Vec<&str> = cmd.args().collect();
    assert_eq!(args.len(), cmd.arg_count());
    for (i, arg) in args.iter().enumerate() {
        assert_eq!(cmd.arg(i), Some(*arg));
        let rest = cmd.rest_from(i);
        assert!(rest.starts_with(arg));
        assert!(line.trim_end().ends_with(rest));
    }
    assert_eq!(cmd.rest_from(args.len()), "");
});
