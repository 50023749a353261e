use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("sift")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Sift Contributors")
        .about("Extract main content from HTML documents with quality-gated fallbacks")
        .arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, html, text, json)")
                .value_name("FORMAT")
                .default_value("markdown")
                .value_parser(["markdown", "html", "text", "json"]),
        )
        .arg(clap::arg!(--url <URL> "Source URL of the document, used to match site profiles").value_name("URL"))
        .arg(
            clap::arg!(--"min-quality" <NUM> "Minimum gate score a non-final stage must reach (0-100)")
                .value_name("NUM"),
        )
        .arg(clap::arg!(--"timeout-ms" <MS> "Pipeline deadline in milliseconds (0 disables)").value_name("MS"))
        .arg(
            clap::arg!(--config <FILE> "JSON file with pipeline settings; flags override it")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--profile <FILE> "Additional site profile (JSON), may be repeated")
                .value_name("FILE")
                .action(clap::ArgAction::Append)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-site-specific" "Skip the site-specific stage"))
        .arg(clap::arg!(--"no-semantic" "Skip the semantic stage"))
        .arg(clap::arg!(--"no-readability" "Skip the readability-style stage"))
        .arg(clap::arg!(--"no-heuristic" "Skip the heuristic stage"))
        .arg(clap::arg!(--report "Print the quality report of the winning stage to stderr"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "sift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "sift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "sift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "sift", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
