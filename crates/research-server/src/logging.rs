use std::io::Write;

/// Filter directives for the logger. An explicit `--log-level` / `RUST_LOG`
/// value wins. Otherwise our crates log at `debug` or `info` and HTTP client
/// internals stay at `warn`.
pub fn filter_spec(debug: bool, log_level: Option<&str>) -> String {
    if let Some(filter) = log_level.map(str::trim).filter(|f| !f.is_empty()) {
        return filter.to_string();
    }

    let level = if debug { "debug" } else { "info" };
    format!(
        "{level},research_server={level},research_agents={level},research_llm={level},hyper=warn,reqwest=warn,rustls=warn"
    )
}

pub fn init_logging(debug: bool, log_level: Option<&str>) {
    env_logger::Builder::new()
        .parse_filters(&filter_spec(debug, log_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
