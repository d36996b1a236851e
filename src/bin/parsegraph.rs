fn main() {
    parsegraph::cli::run();
}
