use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("annonce")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract structured real-estate listings from listing pages")
        .arg(clap::arg!(<INPUT> "Listing URL, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(clap::arg!(--text "Treat file or stdin input as pasted listing text instead of HTML"))
        .arg(clap::arg!(--base_url <URL> "Page URL of a local HTML file, used for URL-based hints").value_name("URL"))
        .arg(clap::arg!(--timeout <SECS> "Timeout applied to every transport, in seconds"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for direct requests").value_name("UA"))
        .arg(
            clap::arg!(--min_core_fields <NUM> "Core fields (price, surface) a record needs to be accepted")
                .default_value("2")
                .value_parser(clap::value_parser!(u8).range(1..=2)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    for shell in [
        clap_complete::Shell::Bash,
        clap_complete::Shell::Zsh,
        clap_complete::Shell::Fish,
        clap_complete::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "annonce", &completions_dir).unwrap();
    }

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
