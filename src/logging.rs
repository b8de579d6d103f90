use std::io::Write;

/// Install the process logger: `YYYY-MM-DD HH:MM:SS - LEVEL - message` on
/// stderr. `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a logger may already be installed (tests, embedding)
    let _ = builder.try_init();
}
