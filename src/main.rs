fn main() {
    #[cfg(feature = "cli")]
    dfc::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("dfc: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
