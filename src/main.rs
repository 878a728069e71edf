fn main() {
    modernity_report::cli::run();
}
