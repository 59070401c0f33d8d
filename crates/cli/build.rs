use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pagesift")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pagesift contributors")
        .about("Scrape headings, text, links, images and tables from web pages into CSV")
        .arg(clap::arg!([URL] ... "URLs to scrape (comma or newline separated), or '-' to read them from stdin"))
        .arg(clap::arg!(-i --input <FILE> "Read URLs from a file, or '-' for stdin").value_name("FILE"))
        .arg(clap::arg!(--interactive "Prompt for URLs; a blank line starts scraping, EOF quits"))
        .arg(
            clap::arg!(-o --"output-dir" <DIR> "Directory for the CSV files (default: current directory)")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--"min-chunk-len" <NUM> "Only keep loose text longer than this many characters"))
        .arg(clap::arg!(--"no-nested" "Skip elements nested inside an already recorded element"))
        .arg(clap::arg!(--bom "Start CSV files with a UTF-8 byte order mark"))
        .arg(clap::arg!(--"unique-names" "Add a short URL hash to file names"))
        .arg(
            clap::arg!(--config <FILE> "Config file (default: <config dir>/pagesift/config.toml)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagesift", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
