use smarthome_config::AppConfig;
use smarthome_db::MigrationSource;

/// Print the startup banner with a config summary.
pub fn print_banner(config: &AppConfig) {
    let version = env!("CARGO_PKG_VERSION");

    let url = format!("http://{}:{}", config.server.host, config.server.port);
    let bundled = MigrationSource::bundled()
        .load()
        .map(|scripts| scripts.len())
        .unwrap_or(0);
    let migrations = if config.database.run_migrations {
        format!("{bundled} bundled, applied on start")
    } else {
        format!("{bundled} bundled, start-up run disabled")
    };

    let width = 72;
    let left_w = 26;
    let right_w = width - left_w - 3;

    let title = format!("Smarthome v{version}");
    let title_dashes = width - 2 - title.len() - 5;
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let row = |l: &str, r: &str| format!("│ {:<left_w$}│  {:<right_w$}│", l, r);
    let clip = |s: &str| -> String {
        let max = right_w - 12;
        if s.chars().count() > max {
            let head: String = s.chars().take(max - 1).collect();
            format!("{head}…")
        } else {
            s.to_string()
        }
    };

    println!("{top}");
    println!("{}", row("", ""));
    println!("{}", row("  Sensor registry", "API"));
    println!("{}", row("", &url));
    println!("{}", row("        /\\", &"─".repeat(right_w - 2)));
    println!(
        "{}",
        row("       /  \\", &format!("Database    {}", clip(&config.database.url)))
    );
    println!(
        "{}",
        row(
            "      /____\\",
            &format!("Temperature {}", clip(&config.temperature_api.url))
        )
    );
    println!(
        "{}",
        row("      | [] |", &format!("Migrations  {}", clip(&migrations)))
    );
    println!("{}", row("      |____|", ""));
    println!("{}", row("", "Press Ctrl+C to stop"));
    println!("{bottom}");
}
