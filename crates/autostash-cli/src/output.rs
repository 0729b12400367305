//! stdout helpers for subcommands that honour `--json`.

use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `value` as JSON under `--json`, otherwise the one-line human form.
pub fn print_result<T, D>(json: bool, value: &T, human: D) -> anyhow::Result<()>
where
    T: Serialize,
    D: Display,
{
    if json {
        print_json(value)
    } else {
        println!("{human}");
        Ok(())
    }
}
