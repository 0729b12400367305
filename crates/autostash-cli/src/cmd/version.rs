use crate::output::print_result;

pub fn run(json: bool) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    print_result(
        json,
        &serde_json::json!({ "version": version }),
        format_args!("auto-stash {version}"),
    )
}
