fn main() {
    goembed::cli::run();
}
